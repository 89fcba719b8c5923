pub mod metrics;
pub mod workers;

/// Which half of the deployment this process runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceMode {
    /// `initiate`/`confirm` plus the refresh, assembler and signing workers.
    #[default]
    All,
    /// `sign` only; one endpoint of the multisig fund pool.
    MultisigSigner,
}

impl ServiceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceMode::All => "all",
            ServiceMode::MultisigSigner => "multisig-signer",
        }
    }
}
