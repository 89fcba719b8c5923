use crate::foundation::{Hash32, BLAKE160_SIZE, CKB_HASH_PERSONALIZATION, HASH_SIZE};
use blake2b_simd::{Params, State};

/// Incremental blake2b-256 with the chain's personalization.
pub struct CkbHasher {
    state: State,
}

impl CkbHasher {
    pub fn new() -> Self {
        Self { state: Params::new().hash_length(HASH_SIZE).personal(CKB_HASH_PERSONALIZATION).to_state() }
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.state.update(data);
        self
    }

    pub fn finalize(&self) -> Hash32 {
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(self.state.finalize().as_bytes());
        out
    }
}

impl Default for CkbHasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ckbhash(data: &[u8]) -> Hash32 {
    let mut hasher = CkbHasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn blake160(data: &[u8]) -> [u8; BLAKE160_SIZE] {
    let mut out = [0u8; BLAKE160_SIZE];
    out.copy_from_slice(&ckbhash(data)[..BLAKE160_SIZE]);
    out
}
