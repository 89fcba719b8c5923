use super::{CellPage, CellQuery, ChainClient, KnownScript, ScriptInfo, ScriptRegistry, TxStatus};
use crate::domain::ledger::json::{quantity, JsonBytes, JsonCellOutput, JsonOutPoint, JsonScript, JsonTransaction};
use crate::domain::ledger::{Cell, OutPoint, Transaction};
use crate::foundation::util::encoding::format_quantity;
use crate::foundation::{Result, SwapError, TxHash};
use crate::infrastructure::config::redact_url;
use crate::infrastructure::rpc::{JsonRpcClient, RpcFailure};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const OUTPUTS_VALIDATOR: &str = "passthrough";

#[derive(Deserialize)]
struct RpcLiveCell {
    #[serde(default)]
    cell: Option<RpcCellInfo>,
    status: String,
}

#[derive(Deserialize)]
struct RpcCellInfo {
    output: JsonCellOutput,
    #[serde(default)]
    data: Option<RpcCellData>,
}

#[derive(Deserialize)]
struct RpcCellData {
    content: JsonBytes,
}

#[derive(Serialize)]
struct RpcSearchKey {
    script: JsonScript,
    script_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<RpcSearchFilter>,
    with_data: bool,
}

#[derive(Serialize, Default)]
struct RpcSearchFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    script: Option<JsonScript>,
    #[serde(skip_serializing_if = "Option::is_none")]
    script_len_range: Option<[String; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_data_len_range: Option<[String; 2]>,
}

#[derive(Deserialize)]
struct RpcCellsPage {
    objects: Vec<RpcIndexerCell>,
    #[serde(default)]
    last_cursor: String,
}

#[derive(Deserialize)]
struct RpcIndexerCell {
    output: JsonCellOutput,
    #[serde(default)]
    output_data: Option<JsonBytes>,
    out_point: JsonOutPoint,
}

#[derive(Deserialize)]
struct RpcFeeRateStatistics {
    #[serde(with = "quantity")]
    median: u64,
}

#[derive(Deserialize)]
struct RpcTransactionWithStatus {
    tx_status: RpcTxStatus,
}

#[derive(Deserialize)]
struct RpcTxStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

fn len_range(range: (u64, u64)) -> [String; 2] {
    [format_quantity(u128::from(range.0)), format_quantity(u128::from(range.1))]
}

/// CKB node client over its JSON-RPC interface; the node must run the indexer module.
pub struct HttpChainClient {
    rpc: JsonRpcClient,
    scripts: ScriptRegistry,
    redacted_url: String,
}

impl HttpChainClient {
    pub fn new(url: &str, scripts: ScriptRegistry) -> Result<Self> {
        let redacted_url = redact_url(url);
        info!("node rpc client configured url={}", redacted_url);
        Ok(Self { rpc: JsonRpcClient::new(url)?, scripts, redacted_url })
    }

    fn node_error(&self, method: &str, failure: RpcFailure) -> SwapError {
        warn!("node rpc call failed method={} url={} error={}", method, self.redacted_url, failure);
        SwapError::node_rpc(format!("{method} failed: {failure}"))
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    fn known_script(&self, script: KnownScript) -> Result<ScriptInfo> {
        self.scripts.get(script)
    }

    async fn get_live_cell(&self, out_point: &OutPoint) -> Result<Option<Cell>> {
        let params = (JsonOutPoint::from(out_point), true);
        let live: RpcLiveCell = self.rpc.call("get_live_cell", params).await.map_err(|err| self.node_error("get_live_cell", err))?;
        if live.status != "live" {
            debug!("get_live_cell out_point={} status={}", out_point, live.status);
            return Ok(None);
        }
        let Some(info) = live.cell else {
            return Ok(None);
        };
        let data = info.data.map(|data| data.content.0).unwrap_or_default();
        Ok(Some(Cell { out_point: *out_point, output: info.output.into(), data }))
    }

    async fn find_cells(&self, query: &CellQuery, cursor: Option<String>, limit: u32) -> Result<CellPage> {
        let filter = RpcSearchFilter {
            script: query.type_script.as_ref().map(JsonScript::from),
            script_len_range: query.type_len_range.map(len_range),
            output_data_len_range: query.data_len_range.map(len_range),
        };
        let has_filter = filter.script.is_some() || filter.script_len_range.is_some() || filter.output_data_len_range.is_some();
        let search_key =
            RpcSearchKey { script: JsonScript::from(&query.lock), script_type: "lock", filter: has_filter.then_some(filter), with_data: true };
        let params = (search_key, "asc", format_quantity(u128::from(limit)), cursor);
        let page: RpcCellsPage = self.rpc.call("get_cells", params).await.map_err(|err| self.node_error("get_cells", err))?;

        let exhausted = page.objects.len() < limit as usize || page.last_cursor.is_empty();
        let cells = page
            .objects
            .into_iter()
            .map(|object| Cell {
                out_point: object.out_point.into(),
                output: object.output.into(),
                data: object.output_data.map(|data| data.0).unwrap_or_default(),
            })
            .collect();
        Ok(CellPage { cells, cursor: (!exhausted).then_some(page.last_cursor) })
    }

    async fn fee_rate_statistics(&self) -> Result<Option<u64>> {
        let stats: Option<RpcFeeRateStatistics> = self
            .rpc
            .call("get_fee_rate_statistics", Vec::<serde_json::Value>::new())
            .await
            .map_err(|err| self.node_error("get_fee_rate_statistics", err))?;
        Ok(stats.map(|stats| stats.median))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash> {
        let params = (JsonTransaction::from(tx), OUTPUTS_VALIDATOR);
        let hash: TxHash = self.rpc.call("send_transaction", params).await.map_err(|err| self.node_error("send_transaction", err))?;
        info!("transaction sent tx_hash={}", hash);
        Ok(hash)
    }

    async fn get_transaction_status(&self, tx_hash: &TxHash) -> Result<TxStatus> {
        let response: Option<RpcTransactionWithStatus> =
            self.rpc.call("get_transaction", [tx_hash]).await.map_err(|err| self.node_error("get_transaction", err))?;
        let Some(response) = response else {
            return Ok(TxStatus::Unknown);
        };
        let status = match response.tx_status.status.as_str() {
            "pending" => TxStatus::Pending,
            "proposed" => TxStatus::Proposed,
            "committed" => TxStatus::Committed,
            "rejected" => TxStatus::Rejected,
            _ => TxStatus::Unknown,
        };
        if let Some(reason) = response.tx_status.reason.filter(|_| status == TxStatus::Rejected) {
            debug!("transaction rejected tx_hash={} reason={}", tx_hash, reason);
        }
        Ok(status)
    }
}
