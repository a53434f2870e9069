mod actor_framework;
mod app_system;
mod clients;
mod domain;
mod error;
mod gateway;
mod messages;
mod orchestrator;
mod repository;
mod services;
mod wire;

#[cfg(test)]
mod mock_framework;

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, CliArgs, Platform, PlatformConfig};
use crate::clients::{AccountApi, CatalogApi, OrderApi};
use crate::domain::{OrderLine, Pagination};
use crate::gateway::{AccountSelection, AccountsArgs, ProductsArgs, Query};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let config = PlatformConfig::from_args(CliArgs::parse())?;
    info!(?config, "Starting order platform");

    let platform = Platform::start(config);

    let span = tracing::info_span!("seeding");
    let (account, lamp, bulb) = async {
        let account = platform
            .accounts
            .post_account("Alice", platform.call_deadline())
            .await
            .context("creating account")?;
        let lamp = platform
            .catalog
            .post_product("Lamp", "Brass desk lamp", Decimal::new(1000, 2), platform.call_deadline())
            .await
            .context("creating product")?;
        let bulb = platform
            .catalog
            .post_product("Bulb", "Spare bulb for the lamp", Decimal::new(250, 2), platform.call_deadline())
            .await
            .context("creating product")?;
        anyhow::Ok((account, lamp, bulb))
    }
    .instrument(span)
    .await?;

    info!(account_id = %account.id, "Seeded account and products");

    let span = tracing::info_span!("order_processing");
    let placed = async {
        info!("Placing order through the order service");
        let items = vec![
            OrderLine::new(lamp.id.clone(), 1),
            OrderLine::new(bulb.id.clone(), 4),
            OrderLine::new("discontinued", 2),
        ];
        platform
            .orders
            .post_order(&account.id, items, platform.call_deadline())
            .await
    }
    .instrument(span)
    .await;

    match &placed {
        Ok(order) => info!(order_id = %order.id, total = %order.total_price, "Order placed"),
        Err(e) => error!(error = %e, "Order placement failed"),
    }

    let query = Query::new()
        .accounts(
            AccountsArgs {
                pagination: Pagination::new(0, 10),
                ..AccountsArgs::default()
            },
            AccountSelection::with_orders(),
        )
        .products(ProductsArgs {
            query: Some("lamp".to_string()),
            ..ProductsArgs::default()
        });
    let response = platform
        .gateway()
        .execute(&query)
        .instrument(tracing::info_span!("gateway_query"))
        .await;
    if let Some(accounts) = response.data.accounts.resolved() {
        info!(accounts = accounts.len(), errors = response.errors.len(), "Gateway query answered");
    }
    println!("{}", serde_json::to_string_pretty(&response)?);

    platform.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
