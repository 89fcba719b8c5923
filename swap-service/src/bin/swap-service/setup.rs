use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use swap_core::application::funding::fund_pool_secret;
use swap_core::application::{
    CompositeObserver, EndpointSigner, FundPool, LifecycleObserver, MultisigCoordinator, SwapContext, SwapService, SwapSettings,
};
use swap_core::foundation::util::hex_fmt::hx;
use swap_core::foundation::{SwapError, MAX_RPC_BODY_BYTES};
use swap_core::infrastructure::chain::{ChainClient, HttpChainClient, ScriptRegistry};
use swap_core::infrastructure::config::{self, AppConfig, FundPoolMode};
use swap_core::infrastructure::price::PriceStrategy;
use swap_core::infrastructure::queue::MemoryJobQueue;
use swap_core::infrastructure::signing::{HttpRemoteSigner, SingleKeySigner, TxSigner};
use swap_core::infrastructure::storage::{RocksStorage, SwapStorage};
use swap_service::api::RpcState;
use swap_service::service::metrics::Metrics;
use swap_service::service::workers::{spawn_workers, SupervisedTask};
use swap_service::service::ServiceMode;

pub fn init_logging(log_dir: Option<&str>, filters: &str) -> Result<(), SwapError> {
    swap_core::infrastructure::logging::init_logger(log_dir, filters)
}

pub fn load_app_config(profile: Option<&str>) -> Result<AppConfig, SwapError> {
    let data_dir = config::resolve_data_dir()?;
    let config_path = config::resolve_config_path(&data_dir)?;
    if let Some(profile) = profile {
        info!("loading config profile profile={}", profile.trim());
    }
    config::load_app_config_from_path(&config_path, profile.map(str::trim))
}

pub fn init_storage(app_config: &AppConfig) -> Result<Arc<RocksStorage>, SwapError> {
    if app_config.service.allow_schema_wipe {
        warn!("service.allow_schema_wipe is set; a schema mismatch wipes the database");
    }
    RocksStorage::open_in_dir_with_options(&app_config.service.data_dir, app_config.service.allow_schema_wipe).map(Arc::new)
}

pub struct Components {
    pub state: Arc<RpcState>,
    pub tasks: Vec<SupervisedTask>,
}

fn base_state(app_config: &AppConfig, mode: ServiceMode, metrics: Arc<Metrics>) -> RpcState {
    RpcState {
        mode,
        swap: None,
        signer: None,
        storage: None,
        rpc_token: app_config.rpc.token.clone(),
        rpc_path: app_config.rpc.path.clone(),
        log_request: app_config.rpc.log_request,
        max_body_bytes: app_config.rpc.max_body_bytes.unwrap_or(MAX_RPC_BODY_BYTES),
        metrics,
    }
}

pub fn build(app_config: &AppConfig, mode: ServiceMode, metrics: Arc<Metrics>) -> Result<Components, SwapError> {
    let scripts = ScriptRegistry::from_config(&app_config.scripts)?;
    let chain: Arc<dyn ChainClient> = Arc::new(HttpChainClient::new(&app_config.service.node_rpc_url, scripts.clone())?);
    let fund_pool = FundPool::from_config(app_config, &scripts)?;
    info!("fund pool resolved mode={} lock_args={}", fund_pool.mode, hx(&fund_pool.lock.args));
    match mode {
        ServiceMode::All => build_all(app_config, fund_pool, chain, metrics),
        ServiceMode::MultisigSigner => build_signer(app_config, fund_pool, chain, metrics),
    }
}

fn build_all(
    app_config: &AppConfig,
    fund_pool: FundPool,
    chain: Arc<dyn ChainClient>,
    metrics: Arc<Metrics>,
) -> Result<Components, SwapError> {
    let settings = SwapSettings::from_config(app_config)?;
    let storage = init_storage(app_config)?;
    info!("storage initialized data_dir={}", app_config.service.data_dir);
    PriceStrategy::parse(&app_config.price.strategy)?.apply(storage.as_ref(), &settings.udt_name)?;

    let signer: Arc<dyn TxSigner> = match fund_pool.mode {
        FundPoolMode::Singlesig => {
            Arc::new(SingleKeySigner::new(fund_pool_secret(&app_config.fund_pool)?, fund_pool.lock.clone(), chain.clone()))
        }
        FundPoolMode::Multisig => {
            let endpoints = fund_pool.multisig.as_ref().map(|config| config.endpoints().to_vec()).unwrap_or_default();
            let remote = HttpRemoteSigner::new(&endpoints, app_config.rpc.token.clone(), settings.sign_timeout)?;
            info!("multisig coordinator configured endpoints={}", endpoints.len());
            Arc::new(MultisigCoordinator::from_fund_pool(&fund_pool, chain.clone(), Arc::new(remote))?)
        }
    };

    let mut observer = CompositeObserver::new();
    observer.add_observer(metrics.clone());
    let ctx = SwapContext::new(storage.clone(), chain, Arc::new(MemoryJobQueue::new()), fund_pool, settings)
        .with_observer(Arc::new(observer) as Arc<dyn LifecycleObserver>);

    let tasks = spawn_workers(
        &ctx,
        signer,
        Duration::from_secs(app_config.workers.refresher_interval_secs),
        Duration::from_secs(app_config.workers.assembler_interval_secs),
        metrics.clone(),
    );
    let mut state = base_state(app_config, ServiceMode::All, metrics);
    state.swap = Some(Arc::new(SwapService::new(ctx)));
    state.storage = Some(storage as Arc<dyn SwapStorage>);
    Ok(Components { state: Arc::new(state), tasks })
}

fn build_signer(
    app_config: &AppConfig,
    fund_pool: FundPool,
    chain: Arc<dyn ChainClient>,
    metrics: Arc<Metrics>,
) -> Result<Components, SwapError> {
    if fund_pool.mode != FundPoolMode::Multisig {
        return Err(SwapError::ConfigError("multisig-signer mode needs fund_pool.mode = \"multisig\"".to_string()));
    }
    let signer = EndpointSigner::new(fund_pool_secret(&app_config.fund_pool)?, &fund_pool, chain)?;
    info!("multisig endpoint signer ready pubkey_hash={}", hx(&signer.pubkey_hash()));
    let mut state = base_state(app_config, ServiceMode::MultisigSigner, metrics);
    state.signer = Some(Arc::new(signer));
    Ok(Components { state: Arc::new(state), tasks: Vec::new() })
}
