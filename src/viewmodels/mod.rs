pub mod stock_viewmodel;

pub use stock_viewmodel::StockViewModel;

#[cfg(target_arch = "wasm32")]
pub use stock_viewmodel::browser;
