mod http;

pub use http::HttpApi;
