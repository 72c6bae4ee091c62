//! Command-line arguments

pub mod handler;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::api::models::PreorderFields;
use crate::reconcile::{SkuMatchMode, UpdateStrategy};

/// Clear preorder flags on hosted products listed in a spreadsheet
#[derive(Parser, Debug)]
#[command(name = "preorder-sync", version, about)]
pub struct Cli {
    /// Spreadsheet (.xlsx, .xls, .ods or .csv) with identifier and SKU columns
    #[arg(env = "PREORDER_INPUT", default_value = "Excels/F-10.xlsx")]
    pub file: PathBuf,

    /// Project URL of the product store
    #[arg(long, env = "SUPABASE_URL")]
    pub url: String,

    /// API key for the product store
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub key: String,

    /// Remote table holding the products
    #[arg(long, env = "PREORDER_TABLE", default_value = "Products")]
    pub table: String,

    /// Postgres schema exposed by the REST endpoint, if not the default
    #[arg(long, env = "PREORDER_SCHEMA")]
    pub schema: Option<String>,

    /// Header of the identifier column in the spreadsheet
    #[arg(long, default_value = "id")]
    pub id_column: String,

    /// Header of the SKU column in the spreadsheet
    #[arg(long, default_value = "sku")]
    pub sku_column: String,

    /// Identifier column of the remote table
    #[arg(long, default_value = "id")]
    pub remote_id_column: String,

    /// SKU column of the remote table
    #[arg(long, default_value = "sku")]
    pub remote_sku_column: String,

    /// Boolean column switched off when a product leaves preorder
    #[arg(long, default_value = "preorder")]
    pub preorder_column: String,

    /// Discount column nulled when a product leaves preorder
    #[arg(long, default_value = "preorder_discount")]
    pub discount_column: String,

    /// Date column nulled when a product leaves preorder
    #[arg(long, default_value = "preorder_date")]
    pub date_column: String,

    /// Directory receiving the run report
    #[arg(long, env = "PREORDER_REPORTS_DIR", default_value = "reports")]
    pub reports_dir: PathBuf,

    /// How a sheet SKU is compared with remote SKUs
    #[arg(long, value_enum, default_value_t = SkuMatchArg::PerIdentifier)]
    pub sku_match: SkuMatchArg,

    /// How clearing writes are sent
    #[arg(long = "update", value_enum, default_value_t = UpdateArg::Bulk)]
    pub update: UpdateArg,

    /// Classify and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Attempts per request before giving up (1 disables retries)
    #[arg(long, env = "PREORDER_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds; doubles per attempt
    #[arg(long, default_value_t = 500)]
    pub retry_delay_ms: u64,

    /// Randomize retry delays
    #[arg(long)]
    pub jitter: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Remote columns cleared on matched products
    pub fn preorder_fields(&self) -> PreorderFields {
        PreorderFields {
            flag: self.preorder_column.clone(),
            discount: self.discount_column.clone(),
            date: self.date_column.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SkuMatchArg {
    /// Compare against the SKU of the same product
    PerIdentifier,
    /// Accept any SKU present among the fetched products
    AnyRemote,
}

impl From<SkuMatchArg> for SkuMatchMode {
    fn from(arg: SkuMatchArg) -> Self {
        match arg {
            SkuMatchArg::PerIdentifier => SkuMatchMode::PerIdentifier,
            SkuMatchArg::AnyRemote => SkuMatchMode::AnyRemote,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UpdateArg {
    /// One request for all matched products
    Bulk,
    /// One request per matched row
    PerRow,
}

impl From<UpdateArg> for UpdateStrategy {
    fn from(arg: UpdateArg) -> Self {
        match arg {
            UpdateArg::Bulk => UpdateStrategy::Bulk,
            UpdateArg::PerRow => UpdateStrategy::PerRow,
        }
    }
}
