pub mod ads;
pub mod health;
pub mod process_ad;
pub mod storage_file;
