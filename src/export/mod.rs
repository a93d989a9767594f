// Export module - portfolio interchange for external portfolio software

pub mod classify;
pub mod ofx;
pub mod portfolio;

pub use classify::{classify, is_mutual_fund, Classification, Ticker, TickerMap};
pub use ofx::{render_document, render_ofx_date, DocumentInfo};
pub use portfolio::{
    build_export, morning_of, ExportEntry, ExportOptions, InvestmentBuy, PortfolioExport, Security,
};
