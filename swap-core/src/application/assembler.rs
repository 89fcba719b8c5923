use crate::application::context::SwapContext;
use crate::domain::assembly::{apply_fee, build_assembly, plan_batches, AssemblyParams};
use crate::domain::ledger::fee::estimate_fee;
use crate::foundation::Result;
use crate::infrastructure::chain::{collect_cells, current_fee_rate, CellQuery};
use crate::infrastructure::queue::Job;
use log::{debug, info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub dust: usize,
    pub batches: usize,
    pub enqueued: usize,
}

/// Turns dust under the funding lock into fresh asset cells.
pub struct Assembler {
    ctx: SwapContext,
}

impl Assembler {
    pub fn new(ctx: SwapContext) -> Self {
        Self { ctx }
    }

    fn params(&self) -> AssemblyParams {
        let settings = &self.ctx.settings;
        let fund_pool = &self.ctx.fund_pool;
        AssemblyParams {
            funding_lock: fund_pool.lock.clone(),
            udt_script: settings.udt_script.clone(),
            initial_capacity: settings.initial_udt_cell,
            collection_cap: settings.collection_cap,
            collection_lock: settings.collection_lock.clone(),
            cell_deps: fund_pool.cell_deps.iter().chain(settings.udt_cell_deps.iter()).cloned().collect(),
            witness_lock_placeholder: fund_pool.witness_placeholder.clone(),
        }
    }

    pub async fn run_cycle(&self) -> Result<AssemblyReport> {
        let settings = &self.ctx.settings;
        let lock = self.ctx.fund_pool.lock.clone();
        let mut dust = collect_cells(self.ctx.chain.as_ref(), &CellQuery::by_lock(lock.clone()).plain()).await?;
        let asset_cells = collect_cells(self.ctx.chain.as_ref(), &CellQuery::by_lock(lock).with_type(settings.udt_script.clone())).await?;
        dust.extend(asset_cells.into_iter().filter(|cell| cell.output.capacity < settings.min_udt_cell));

        let mut report = AssemblyReport { dust: dust.len(), ..AssemblyReport::default() };
        if dust.is_empty() {
            debug!("assembler found no dust");
            return Ok(report);
        }
        let batches = plan_batches(dust, settings.initial_udt_cell);
        report.batches = batches.len();
        let params = self.params();
        let fee_rate = current_fee_rate(self.ctx.chain.as_ref()).await?;
        for batch in batches {
            let built = build_assembly(&batch, &params).and_then(|mut tx| {
                let fee = estimate_fee(&tx, fee_rate);
                apply_fee(&mut tx, fee)?;
                Ok(tx)
            });
            match built {
                Ok(tx) => {
                    debug!("assembly enqueued inputs={} outputs={} tx_hash={}", tx.inputs.len(), tx.outputs.len(), tx.hash());
                    self.ctx.queue.enqueue(Job::sign_and_send(tx)).await?;
                    report.enqueued += 1;
                }
                Err(err) => warn!("skipping dust batch cells={} error={}", batch.len(), err),
            }
        }
        info!("assembler cycle done dust={} batches={} enqueued={}", report.dust, report.batches, report.enqueued);
        Ok(report)
    }
}
