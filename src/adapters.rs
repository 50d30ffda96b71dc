pub mod http;
pub mod pelecard;
pub mod sumit;
