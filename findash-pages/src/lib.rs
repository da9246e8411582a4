//! FinDash Pages — sessions, configuration and the dashboard page controllers.
//!
//! This crate builds on `findash-core` to provide:
//! - Settings (TOML) and app references (JSON)
//! - Sessions with persistent selections, refresh and a per-request context
//! - Page controllers: overview, securities, portfolio, forex, commodities,
//!   macro, financials and the data explorer
//! - Front-end independent page views (tables, charts, metrics, notices)

pub mod config;
pub mod pages;
pub mod session;
pub mod view;

pub use config::{AppRefs, ConfigError, InstrumentTree, Settings};
pub use pages::{
    available_sources, render_commodities, render_explorer, render_financials, render_forex,
    render_macro, render_overview, render_portfolio, render_security, CommodityParams,
    ExplorerParams, ExplorerSource, ForexParams, MacroCategory, MacroParams,
};
pub use session::{dedup_tickers, RequestContext, Selections, Session};
pub use view::{Metric, Notice, NoticeLevel, PageView, Section, SectionBody};
