pub mod builders;
pub mod constants;
pub mod harness;

#[allow(unused_imports)]
pub use builders::*;
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use harness::*;
#[allow(unused_imports)]
pub use signers::*;
