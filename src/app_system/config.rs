use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::gateway::GatewayConfig;

const DEFAULT_CHANNEL_BUFFER: usize = 100;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ORDERS_FIELD_TIMEOUT_MS: u64 = 3_000;

#[derive(Parser, Debug, Clone)]
#[command(name = "order_mesh", about = "In-process order platform with an aggregation gateway", version)]
pub struct CliArgs {
    #[arg(
        long,
        env = "ORDER_MESH_CHANNEL_BUFFER",
        value_name = "N",
        default_value_t = DEFAULT_CHANNEL_BUFFER,
        help = "Request channel capacity of every service and store"
    )]
    pub channel_buffer: usize,

    #[arg(
        long,
        env = "ORDER_MESH_CALL_TIMEOUT_MS",
        value_name = "MS",
        default_value_t = DEFAULT_CALL_TIMEOUT_MS,
        help = "Deadline for top-level service calls"
    )]
    pub call_timeout_ms: u64,

    #[arg(
        long,
        env = "ORDER_MESH_ORDERS_FIELD_TIMEOUT_MS",
        value_name = "MS",
        default_value_t = DEFAULT_ORDERS_FIELD_TIMEOUT_MS,
        help = "Deadline for each Account.orders lookup in the gateway"
    )]
    pub orders_field_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    pub channel_buffer: usize,
    pub call_timeout: Duration,
    pub orders_field_timeout: Duration,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            call_timeout: Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS),
            orders_field_timeout: Duration::from_millis(DEFAULT_ORDERS_FIELD_TIMEOUT_MS),
        }
    }
}

impl PlatformConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            channel_buffer,
            call_timeout_ms,
            orders_field_timeout_ms,
        } = args;

        anyhow::ensure!(channel_buffer > 0, "channel buffer must be at least 1");
        anyhow::ensure!(call_timeout_ms > 0, "call timeout must be greater than zero");
        anyhow::ensure!(
            orders_field_timeout_ms > 0,
            "orders field timeout must be greater than zero"
        );

        Ok(Self {
            channel_buffer,
            call_timeout: Duration::from_millis(call_timeout_ms),
            orders_field_timeout: Duration::from_millis(orders_field_timeout_ms),
        })
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            call_timeout: self.call_timeout,
            orders_field_timeout: self.orders_field_timeout,
        }
    }
}
