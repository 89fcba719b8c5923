mod multisig_signing;
mod workers;
