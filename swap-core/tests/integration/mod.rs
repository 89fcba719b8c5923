mod reservation_contract;
mod storage_persistence;
