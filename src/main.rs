// src/main.rs
use sheet_trade::adapter::{parse_quote_targets, Cli, Command, PollingCoordinator};
use sheet_trade::application::usecase::{OrderPlacer, PricingResolver, SheetOrderPipeline};
use sheet_trade::config::{Config, SheetBackend};
use sheet_trade::domain::errors::{AppError, AppResult, SessionError, SessionResult};
use sheet_trade::domain::model::Direction;
use sheet_trade::domain::repository::SheetRepository;
use sheet_trade::domain::service::SymbolClassifier;
use sheet_trade::infrastructure::sheets::quote_worksheet;
use sheet_trade::infrastructure::{
    CsvSheetRepository, GoogleSheetRepository, HttpTransport, InstrumentCatalog, JsonFileLedger,
    KiteAuthenticator, KiteCredentials, KiteSession, ServiceAccountKey,
};

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::signal::ctrl_c;

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting sheet_trade v{}", env!("CARGO_PKG_VERSION"));

    let transport = HttpTransport::new(config.pipeline.call_timeout());

    let command = cli.command();
    match &command {
        Command::Poll => poll(&config, transport).await,
        Command::Place { .. } => {
            let (request, options) = command
                .order_request()
                .zip(command.placement_options())
                .ok_or_else(|| AppError::InvalidInput("not a place command".to_string()))?;

            let session = Arc::new(open_session(&config, &transport).await?);
            let placer = build_placer(&config, session.clone());
            let result = placer.place_with(&request, &options).await;
            session.disconnect();

            let placed = result?;
            println!(
                "Order {} placed: {} {} {} {} @ {} ({})",
                placed.order_id,
                placed.order_type,
                request.direction,
                request.quantity,
                placed.instrument,
                placed
                    .limit_price
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "market".to_string()),
                placed.product
            );
            Ok(())
        }
        Command::Quote { targets, side } => {
            let instruments = parse_quote_targets(targets)?;
            let session = open_session(&config, &transport).await?;
            let refs: Vec<_> = instruments.iter().collect();
            let result = session.get_quotes(&refs).await;
            session.disconnect();

            for depth in result? {
                match *side {
                    Some(direction) => match depth.same_side(direction) {
                        Some(level) => println!(
                            "{} {} side: price={} quantity={}",
                            depth.instrument,
                            side_name(direction),
                            level.price,
                            level.quantity
                        ),
                        None => println!("{} {} side: no depth", depth.instrument, side_name(direction)),
                    },
                    None => {
                        let bid = depth.best_bid.map(|l| format!("{} x {}", l.price, l.quantity));
                        let ask = depth.best_ask.map(|l| format!("{} x {}", l.price, l.quantity));
                        println!(
                            "{} bid={} ask={}",
                            depth.instrument,
                            bid.unwrap_or_else(|| "-".to_string()),
                            ask.unwrap_or_else(|| "-".to_string())
                        );
                    }
                }
            }
            Ok(())
        }
        Command::Instrument { exchange, symbol } => {
            let catalog = InstrumentCatalog::new(
                &config.instruments.file,
                &config.instruments.url,
                config.instruments.max_age(),
            );
            catalog.ensure_fresh(&transport).await?;

            match catalog.lookup(exchange.trim(), symbol.trim())? {
                Some(record) => println!(
                    "{}:{} token={} name={} lot_size={}",
                    record.exchange,
                    record.tradingsymbol,
                    record.instrument_token,
                    record.name,
                    record.lot_size.map(|l| l.to_string()).unwrap_or_else(|| "-".to_string())
                ),
                None => println!("No instrument found for {} on {}", symbol, exchange),
            }
            Ok(())
        }
        Command::Login => {
            let session = open_session(&config, &transport).await?;
            println!("Access token is valid: {}", session.access_token());
            session.disconnect();
            Ok(())
        }
        Command::Classify { symbol } => {
            let classifier = SymbolClassifier::new(config.pipeline.classifier_rules());
            let classification = classifier.classify(symbol.trim());
            println!(
                "{} -> exchange={} product={}",
                symbol.trim(),
                classification.exchange,
                classification.default_product
            );
            Ok(())
        }
    }
}

/// Run the sheet pipeline until Ctrl+C
async fn poll(config: &Config, transport: HttpTransport) -> AppResult<()> {
    config.validate_for_polling()?;

    let session = Arc::new(open_session(config, &transport).await?);
    let placer = build_placer(config, session.clone());

    let sheet: Box<dyn SheetRepository> = match config.sheet.backend {
        SheetBackend::Google => Box::new(google_sheet(config, &transport, &config.sheet.worksheet)?),
        SheetBackend::Csv => Box::new(CsvSheetRepository::new(&config.sheet.csv_path)),
    };

    let mut pipeline = SheetOrderPipeline::new(placer, sheet, config.pipeline.row_throttle());
    if let Some(path) = &config.pipeline.ledger_path {
        log::info!("Using submission ledger {}", path);
        pipeline = pipeline.with_ledger(Arc::new(JsonFileLedger::open(path)?));
    }

    let mut coordinator = PollingCoordinator::new(pipeline, config.pipeline.poll_interval());

    log::info!("Bot is running. Press Ctrl+C to stop.");
    let summary = coordinator
        .run_until(async {
            if let Err(e) = ctrl_c().await {
                log::error!("Failed to listen for control-c event: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    // Shutdown
    log::info!("Shutting down...");
    session.disconnect();
    log::info!("Shutdown complete after {} cycle(s). Goodbye!", summary.cycles);
    Ok(())
}

fn build_placer(config: &Config, session: Arc<KiteSession>) -> OrderPlacer {
    let classifier = SymbolClassifier::new(config.pipeline.classifier_rules());
    let resolver = PricingResolver::new(session.clone());
    OrderPlacer::new(classifier, resolver, session)
}

fn google_sheet(
    config: &Config,
    transport: &HttpTransport,
    worksheet: &str,
) -> AppResult<GoogleSheetRepository> {
    let key = ServiceAccountKey::from_file(&config.sheet.service_account_file)?;
    Ok(GoogleSheetRepository::new(
        &config.sheet.spreadsheet_id,
        worksheet,
        key,
        transport.clone(),
    ))
}

/// Acquire a validated broker session, logging in interactively if needed
async fn open_session(config: &Config, transport: &HttpTransport) -> AppResult<KiteSession> {
    let mut credentials = KiteCredentials {
        api_key: config.broker.api_key.clone(),
        api_secret: config.broker.api_secret.clone(),
    };
    let mut candidates: Vec<String> = config.broker.access_token.iter().cloned().collect();

    if config.broker.credentials_from_sheet {
        let [api_key, api_secret, access_token] = sheet_credentials(config, transport).await?;
        if !api_key.is_empty() {
            credentials.api_key = api_key;
        }
        if !api_secret.is_empty() {
            credentials.api_secret = api_secret;
        }
        if !access_token.is_empty() {
            candidates.insert(0, access_token);
        }
    }

    let authenticator = KiteAuthenticator::new(credentials, &config.broker.base_url, transport.clone())
        .with_token_file(&config.broker.token_file);

    Ok(authenticator.acquire(&candidates, prompt_request_token).await?)
}

/// api_key, api_secret and access token from B1:B3 of the Info worksheet
async fn sheet_credentials(config: &Config, transport: &HttpTransport) -> AppResult<[String; 3]> {
    if config.sheet.backend != SheetBackend::Google {
        return Err(AppError::Config(
            "Sheet credentials need the google sheet backend".to_string(),
        ));
    }

    let mut info = google_sheet(config, transport, &config.sheet.info_worksheet)?;
    info.connect().await?;
    let range = format!("{}!B1:B3", quote_worksheet(&config.sheet.info_worksheet));
    let rows = info.read_range(&range).await?;

    let cell = |idx: usize| {
        rows.get(idx)
            .and_then(|row| row.first())
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };
    log::info!("Read broker credentials from worksheet {}", config.sheet.info_worksheet);
    Ok([cell(0), cell(1), cell(2)])
}

fn prompt_request_token(login_url: &str) -> SessionResult<String> {
    println!("Login URL: {}", login_url);
    print!("Enter request token: ");
    io::stdout()
        .flush()
        .map_err(|e| SessionError::Authentication(e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| SessionError::Authentication(e.to_string()))?;

    let token = line.trim().to_string();
    if token.is_empty() {
        return Err(SessionError::Authentication("no request token entered".to_string()));
    }
    Ok(token)
}

fn side_name(direction: Direction) -> &'static str {
    match direction {
        Direction::Buy => "bid",
        Direction::Sell => "ask",
    }
}
