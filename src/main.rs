use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokenshop::application::balance::BalanceMonitor;
use tokenshop::application::catalog::CatalogService;
use tokenshop::application::orders::OrderService;
use tokenshop::application::pricing::{Currency, PriceService, format_amount};
use tokenshop::application::settings::SettingsService;
use tokenshop::config::Config;
use tokenshop::domain::address::Address;
use tokenshop::domain::catalog::{Category, ProductFilter, ProductTab};
use tokenshop::domain::order::OrderStatus;
use tokenshop::domain::ports::{ChainRpcRef, TableStoreRef, WalletProviderRef};
use tokenshop::infrastructure::gecko_price::GeckoPriceSource;
use tokenshop::infrastructure::in_memory::InMemoryBackend;
use tokenshop::infrastructure::rest_backend::RestBackend;
use tokenshop::infrastructure::solana_rpc::SolanaRpc;
use tokenshop::infrastructure::watch_wallet::WatchOnlyWallet;
use tokenshop::interfaces::csv::product_reader::ProductReader;
use tokenshop::interfaces::csv::product_writer::ProductWriter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the product catalog
    #[command(subcommand)]
    Products(ProductsCommand),
    /// Manage product categories
    #[command(subcommand)]
    Categories(CategoriesCommand),
    /// List orders and change their status
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// Show or change shipping settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// List hero banner slides in the configured language
    Slides,
    /// Print the token's USD spot price
    Price,
    /// Convert between USD and tokens at the spot price
    Convert {
        amount: Decimal,
        /// Treat AMOUNT as tokens and print USD
        #[arg(long)]
        to_usd: bool,
    },
    /// Print a wallet's token balance
    Balance {
        owner: Address,
        /// Keep polling; print the balance, then each change
        #[arg(long)]
        watch: bool,
    },
    /// Print the associated token account of a wallet
    TokenAccount { owner: Address },
}

#[derive(Subcommand)]
enum ProductsCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Category slug, or `all`
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum, default_value_t = Tab::All)]
        tab: Tab,
    },
    /// Import products from a CSV file priced in USD
    Import {
        input: PathBuf,
        /// Validate only; write nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Export products as CSV
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print an import template
    Template,
}

#[derive(Subcommand)]
enum CategoriesCommand {
    List,
    Add {
        name_en: String,
        #[arg(long)]
        name_tr: Option<String>,
        #[arg(long)]
        slug: Option<String>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum OrdersCommand {
    List {
        #[arg(long)]
        wallet: Option<Address>,
    },
    SetStatus { id: String, status: OrderStatus },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        shipping_cost: Option<Decimal>,
        #[arg(long)]
        free_shipping_threshold: Option<Decimal>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Tab {
    All,
    Featured,
    BestSelling,
    Discounted,
}

impl From<Tab> for ProductTab {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::All => ProductTab::All,
            Tab::Featured => ProductTab::Featured,
            Tab::BestSelling => ProductTab::BestSelling,
            Tab::Discounted => ProductTab::Discounted,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "tokenshop=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().into_diagnostic()?;

    match cli.command {
        Command::Products(command) => products(&config, command).await,
        Command::Categories(command) => categories(&config, command).await,
        Command::Orders(command) => orders(&config, command).await,
        Command::Settings(command) => settings(&config, command).await,
        Command::Slides => slides(&config).await,
        Command::Price => {
            let price = price_service(&config).spot_price().await;
            println!("1 {} = ${}", config.chain.token_symbol, price.normalize());
            Ok(())
        }
        Command::Convert { amount, to_usd } => {
            let prices = price_service(&config);
            let symbol = config.chain.token_symbol.as_str();
            if to_usd {
                let usd = prices.token_to_usd(amount).await;
                println!("{}", format_amount(usd, Currency::Usd));
            } else {
                let tokens = prices.usd_to_token(amount).await;
                println!("{}", format_amount(tokens, Currency::Token(symbol)));
            }
            Ok(())
        }
        Command::Balance { owner, watch } => balance(&config, owner, watch).await,
        Command::TokenAccount { owner } => {
            let account =
                Address::associated_token_address(&owner, &config.chain.token_mint).into_diagnostic()?;
            println!("{account}");
            Ok(())
        }
    }
}

async fn backend(config: &Config) -> Result<TableStoreRef> {
    match &config.backend {
        Some(backend) => Ok(Arc::new(RestBackend::new(&backend.url, &backend.anon_key))),
        None => {
            warn!("WARNING: SUPABASE_URL is not set, using an in-memory backend with demo data");
            Ok(Arc::new(InMemoryBackend::with_demo_data().await.into_diagnostic()?))
        }
    }
}

fn price_service(config: &Config) -> PriceService {
    PriceService::new(
        Box::new(GeckoPriceSource::new(&config.pricing.oracle_url)),
        config.pricing.cache_ttl,
        config.pricing.fallback_usd,
    )
}

async fn products(config: &Config, command: ProductsCommand) -> Result<()> {
    let catalog = CatalogService::new(backend(config).await?);
    let symbol = config.chain.token_symbol.as_str();

    match command {
        ProductsCommand::List {
            search,
            category,
            tab,
        } => {
            let products = catalog.list_products().await.into_diagnostic()?;
            let filter = ProductFilter {
                search,
                category,
                tab: tab.into(),
            };
            for product in filter.apply(&products) {
                println!(
                    "{}\t{}\t{}\t{}\tstock {}",
                    product.id.unwrap_or_default(),
                    product.name,
                    product.category,
                    format_amount(product.effective_price(), Currency::Token(symbol)),
                    product.stock
                );
            }
        }
        ProductsCommand::Import { input, dry_run } => {
            let file = File::open(&input).into_diagnostic()?;
            let reader = ProductReader::new(file).into_diagnostic()?;
            let preview = catalog
                .preview_import(reader.rows(), &price_service(config))
                .await
                .into_diagnostic()?;
            for error in &preview.errors {
                eprintln!("{error}");
            }
            if dry_run {
                println!("{} valid products, {} errors", preview.products.len(), preview.errors.len());
            } else {
                let stored = catalog
                    .bulk_add_products(&preview.products)
                    .await
                    .into_diagnostic()?;
                info!(count = stored.len(), "import finished");
                println!("Imported {} products, {} errors", stored.len(), preview.errors.len());
            }
        }
        ProductsCommand::Export { output } => {
            let products = catalog.list_products().await.into_diagnostic()?;
            match output {
                Some(path) => {
                    let file = File::create(path).into_diagnostic()?;
                    ProductWriter::new(file).write_products(&products).into_diagnostic()?;
                }
                None => {
                    let stdout = io::stdout();
                    ProductWriter::new(stdout.lock())
                        .write_products(&products)
                        .into_diagnostic()?;
                }
            }
        }
        ProductsCommand::Template => {
            let stdout = io::stdout();
            ProductWriter::new(stdout.lock())
                .write_template()
                .into_diagnostic()?;
        }
    }
    Ok(())
}

async fn categories(config: &Config, command: CategoriesCommand) -> Result<()> {
    let catalog = CatalogService::new(backend(config).await?);
    match command {
        CategoriesCommand::List => {
            for category in catalog.list_categories().await.into_diagnostic()? {
                println!(
                    "{}\t{}\t{}\t{}",
                    category.id.unwrap_or_default(),
                    category.slug,
                    category.name_en,
                    category.name_tr
                );
            }
        }
        CategoriesCommand::Add {
            name_en,
            name_tr,
            slug,
        } => {
            let mut category = Category::new(name_en, slug);
            if let Some(name_tr) = name_tr {
                category.name_tr = name_tr;
            }
            let stored = catalog.add_category(&category).await.into_diagnostic()?;
            println!("{}\t{}", stored.id.unwrap_or_default(), stored.slug);
        }
        CategoriesCommand::Delete { id } => {
            catalog.delete_category(id).await.into_diagnostic()?;
        }
    }
    Ok(())
}

async fn orders(config: &Config, command: OrdersCommand) -> Result<()> {
    let orders = OrderService::new(backend(config).await?);
    let symbol = config.chain.token_symbol.as_str();
    match command {
        OrdersCommand::List { wallet } => {
            for order in orders.list_orders(wallet.as_ref()).await.into_diagnostic()? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    order.id,
                    order.status,
                    order.user_wallet,
                    format_amount(order.total, Currency::Token(symbol)),
                    order
                        .created_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default()
                );
            }
        }
        OrdersCommand::SetStatus { id, status } => {
            let order = orders.update_status(&id, status).await.into_diagnostic()?;
            println!("{}\t{}", order.id, order.status);
        }
    }
    Ok(())
}

async fn settings(config: &Config, command: SettingsCommand) -> Result<()> {
    let service = SettingsService::new(backend(config).await?);
    let symbol = config.chain.token_symbol.as_str();
    let mut current = service.load().await.into_diagnostic()?;

    if let SettingsCommand::Set {
        shipping_cost,
        free_shipping_threshold,
    } = command
    {
        if let Some(cost) = shipping_cost {
            current.shipping_cost = cost;
        }
        if let Some(threshold) = free_shipping_threshold {
            current.free_shipping_threshold = threshold;
        }
        current = service.update(&current).await.into_diagnostic()?;
    }

    println!(
        "shipping_cost\t{}",
        format_amount(current.shipping_cost, Currency::Token(symbol))
    );
    println!(
        "free_shipping_threshold\t{}",
        format_amount(current.free_shipping_threshold, Currency::Token(symbol))
    );
    Ok(())
}

async fn slides(config: &Config) -> Result<()> {
    let service = SettingsService::new(backend(config).await?);
    let lang = config.language;
    for slide in service.list_slides().await.into_diagnostic()? {
        println!(
            "{}\t{}\t{}",
            slide.slide_order,
            slide.title(lang),
            slide.subtitle(lang)
        );
    }
    Ok(())
}

async fn balance(config: &Config, owner: Address, watch: bool) -> Result<()> {
    let chain: ChainRpcRef = Arc::new(SolanaRpc::new(
        &config.chain.rpc_url,
        config.chain.confirm_timeout,
    ));
    let wallet: WalletProviderRef = Arc::new(WatchOnlyWallet::new(owner));
    let monitor = BalanceMonitor::new(Some(wallet), chain, config.chain.token_mint);
    let symbol = config.chain.token_symbol.as_str();

    if !watch {
        let amount = monitor.check_balance(&owner).await;
        println!("{}", format_amount(amount, Currency::Token(symbol)));
        return Ok(());
    }

    let (mut rx, handle) = monitor.spawn(config.chain.balance_poll_interval);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let amount = rx.borrow_and_update().amount;
                println!("{}", format_amount(amount, Currency::Token(symbol)));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    drop(rx);
    handle.await.into_diagnostic()?;
    Ok(())
}
