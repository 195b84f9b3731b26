pub mod request_info;

pub use request_info::{extract_ip_address, extract_language, extract_referer, extract_user_agent};
