pub mod access;
pub mod catalog;
pub mod storage;
pub mod transaction;
