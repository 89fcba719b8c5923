use super::{InitiateOutcome, SwapService};
use crate::domain::ledger::fee::estimate_fee;
use crate::domain::ledger::udt::{checked_sum, encode_udt_amount, udt_amount};
use crate::domain::ledger::{Cell, CellInput, OutPoint, Transaction, WitnessArgs};
use crate::domain::pricing::calculate_bid_udts;
use crate::domain::swap::{asset_balance, debit_asset, SavedTransaction, SwapPhase};
use crate::foundation::util::time::now_secs;
use crate::foundation::{Result, SwapError, FEE_MARGIN_SHANNONS};
use crate::infrastructure::chain::{current_fee_rate, resolve_inputs};
use log::{debug, info};
use rust_decimal::Decimal;

fn checked_capacity(values: impl IntoIterator<Item = u64>) -> Result<u64> {
    values
        .into_iter()
        .try_fold(0u64, |acc, value| acc.checked_add(value))
        .ok_or_else(|| SwapError::invalid_input("capacity overflow"))
}

impl SwapService {
    /// Reserves funding cells for the capacity the caller asks for and prices it in asset units.
    ///
    /// Every cell locked along the way is released again when the call fails.
    pub async fn initiate(&self, tx: Transaction, asset_indices: &[usize]) -> Result<InitiateOutcome> {
        let result = self.try_initiate(tx, asset_indices).await;
        if let Err(err) = &result {
            self.ctx.observer.on_failed(SwapPhase::Initiated, err);
        }
        result
    }

    async fn try_initiate(&self, mut tx: Transaction, asset_indices: &[usize]) -> Result<InitiateOutcome> {
        let settings = &self.ctx.settings;
        tx.normalize_outputs_data();
        if tx.witnesses.len() > tx.inputs.len() {
            return Err(SwapError::invalid_input(format!("{} witnesses for {} inputs", tx.witnesses.len(), tx.inputs.len())));
        }

        let inputs = resolve_inputs(self.ctx.chain.as_ref(), &tx).await?;
        let service_locks = self.ctx.service_locks();
        if let Some(owned) = inputs.iter().find(|cell| service_locks.contains(&&cell.output.lock)) {
            return Err(SwapError::SelfTrade { out_point: owned.out_point.to_string() });
        }

        let input_capacity = checked_capacity(inputs.iter().map(|cell| cell.output.capacity))?;
        let output_capacity = tx.outputs_capacity()?;
        let bid_no_fee = output_capacity.checked_sub(input_capacity).filter(|bid| *bid > 0).ok_or(SwapError::InsufficientBid)?;

        let price = self
            .ctx
            .storage
            .get_price(&settings.udt_name)?
            .ok_or_else(|| SwapError::PriceUnavailable { udt: settings.udt_name.to_string() })?;
        let available = asset_balance(&tx, asset_indices, &settings.udt_script)?;
        let target = bid_no_fee.checked_add(FEE_MARGIN_SHANNONS).ok_or_else(|| SwapError::invalid_input("bid overflow"))?;
        let estimate = calculate_bid_udts(price, settings.incentive_percent, target)?;
        if available <= estimate {
            return Err(SwapError::InsufficientAsset { required: estimate, available });
        }
        debug!("initiate priced bid_no_fee={} price={} estimate={} available={}", bid_no_fee, price, estimate, available);

        let now = now_secs();
        let valid_until = now + settings.locked_seconds;
        let mut locked = Vec::new();
        let result = self.reserve_and_build(tx, asset_indices, price, bid_no_fee, target, now, valid_until, &mut locked).await;
        if result.is_err() {
            if let Some(key) = locked.last().copied() {
                self.release_locked(&key, &locked);
            }
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn reserve_and_build(
        &self,
        mut tx: Transaction,
        asset_indices: &[usize],
        price: Decimal,
        bid_no_fee: u64,
        target: u64,
        now: u64,
        valid_until: u64,
        locked: &mut Vec<OutPoint>,
    ) -> Result<InitiateOutcome> {
        let settings = &self.ctx.settings;
        let fund_pool = &self.ctx.fund_pool;

        let mut reserved: Vec<Cell> = Vec::new();
        let mut covered = 0u64;
        while covered < target {
            let out_point = self.ctx.storage.lock_cell(now, valid_until)?.ok_or(SwapError::PoolExhausted)?;
            locked.push(out_point);
            let cell = self.load_reserved_cell(&out_point).await?;
            let usable = if reserved.is_empty() { cell.free_capacity() } else { cell.output.capacity };
            covered = covered.saturating_add(usable);
            reserved.push(cell);
        }
        let first = reserved.first().ok_or(SwapError::PoolExhausted)?;

        let first_index = tx.inputs.len();
        for cell in &reserved {
            tx.inputs.push(CellInput::new(cell.out_point));
        }
        tx.witnesses.resize(first_index, Vec::new());
        tx.set_witness_args(first_index, &WitnessArgs::with_lock(fund_pool.witness_placeholder.clone()));
        tx.witnesses.resize(tx.inputs.len(), Vec::new());

        let reserved_capacity = checked_capacity(reserved.iter().map(|cell| cell.output.capacity))?;
        let reserved_asset = checked_sum(reserved.iter().map(|cell| udt_amount(&cell.data)))?;
        let mut merged = first.output.clone();
        merged.capacity = reserved_capacity;
        let merged_index = tx.outputs.len();
        tx.add_output(merged, encode_udt_amount(reserved_asset));
        for dep in fund_pool.cell_deps.iter().chain(settings.udt_cell_deps.iter()) {
            tx.add_cell_dep(dep.clone());
        }

        let fee_rate = current_fee_rate(self.ctx.chain.as_ref()).await?;
        let fee = estimate_fee(&tx, fee_rate);
        let bid = bid_no_fee.checked_add(fee).ok_or_else(|| SwapError::invalid_input("bid overflow"))?;
        if bid > settings.max_traded {
            return Err(SwapError::TradeTooLarge { bid, max: settings.max_traded });
        }
        let ask = calculate_bid_udts(price, settings.incentive_percent, bid)?;

        let merged_data = encode_udt_amount(
            reserved_asset.checked_add(ask).ok_or_else(|| SwapError::Message("asset amount overflow".to_string()))?,
        );
        let occupied = tx.outputs[merged_index].occupied_capacity(merged_data.len());
        tx.outputs[merged_index].capacity = reserved_capacity
            .checked_sub(bid)
            .filter(|capacity| *capacity >= occupied)
            .ok_or_else(|| SwapError::Message(format!("reserved capacity {} cannot deliver bid {}", reserved_capacity, bid)))?;
        tx.outputs_data[merged_index] = merged_data;
        debit_asset(&mut tx, asset_indices, ask)?;

        let saved = SavedTransaction { tx, reserved_cells: locked.clone(), valid_until };
        let key = saved.key().ok_or(SwapError::PoolExhausted)?;
        self.ctx.storage.put_saved_tx(&saved, now + 2 * settings.locked_seconds)?;

        info!(
            "swap initiated key={} reserved={} bid={} fee={} ask={} tx_hash={}",
            key,
            locked.len(),
            bid,
            fee,
            ask,
            saved.tx.hash()
        );
        self.ctx.observer.on_initiated(&key, bid, ask);
        Ok(InitiateOutcome { key, valid_until, tx: saved.tx, ask_tokens: ask, bid_tokens: bid })
    }

    /// Reserved cell content, from the cache when possible.
    async fn load_reserved_cell(&self, out_point: &OutPoint) -> Result<Cell> {
        if let Some(cell) = self.ctx.storage.get_cached_cell(out_point)? {
            return Ok(cell);
        }
        let cell = self
            .ctx
            .chain
            .get_live_cell(out_point)
            .await?
            .ok_or_else(|| SwapError::CellDataMismatch { out_point: out_point.to_string() })?;
        self.ctx.storage.put_cached_cell(&cell)?;
        Ok(cell)
    }
}
