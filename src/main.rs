use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use paypal_express::gateway::PayPalExpress;
use paypal_express::logging;
use paypal_express::models::{BasicAmount, PaymentAction, PaymentDetails};
use paypal_express::{
    CsvLedger, ExpressCheckoutSession, GatewayConfig, GatewayResponse, Payment, PaymentState,
    Server,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "paypal-express")]
#[command(about = "PayPal Express Checkout gateway operations", long_about = None)]
struct Cli {
    #[command(flatten)]
    gateway: GatewayArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GatewayArgs {
    /// TOML file with gateway preferences; flags below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, env = "PAYPAL_LOGIN", global = true)]
    login: Option<String>,
    #[arg(long, env = "PAYPAL_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
    #[arg(long, env = "PAYPAL_SIGNATURE", hide_env_values = true, global = true)]
    signature: Option<String>,
    #[arg(long, env = "PAYPAL_SERVER", global = true)]
    server: Option<String>,
    #[arg(long, global = true)]
    legacy_layout: bool,
}

#[derive(Subcommand)]
enum Command {
    CheckoutUrl(CheckoutUrlArgs),
    Setup(SetupArgs),
    Details(TokenArgs),
    Purchase(SessionArgs),
    Authorize(SessionArgs),
    Capture(CaptureArgs),
    Refund(RefundArgs),
    Credit(CreditArgs),
}

#[derive(Parser)]
struct CheckoutUrlArgs {
    #[arg(long)]
    token: String,
    /// Extra query parameter as key=value; repeatable.
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Sale,
    Authorization,
}

#[derive(Parser)]
struct SetupArgs {
    #[arg(long)]
    amount: f64,
    #[arg(long, default_value = "USD")]
    currency: String,
    #[arg(long)]
    return_url: String,
    #[arg(long)]
    cancel_url: String,
    #[arg(long, value_enum, default_value = "authorization")]
    action: ActionArg,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    invoice: Option<String>,
}

#[derive(Parser)]
struct TokenArgs {
    #[arg(long)]
    token: String,
}

#[derive(Parser)]
struct SessionArgs {
    #[arg(long)]
    token: String,
    #[arg(long)]
    payer_id: String,
    #[arg(long)]
    amount: f64,
}

#[derive(Parser)]
struct CaptureArgs {
    #[arg(long)]
    amount_cents: i64,
    #[arg(long)]
    authorization: String,
    #[arg(long, default_value = "USD")]
    currency: String,
}

#[derive(Parser)]
struct RefundArgs {
    /// Transaction id stored on the checkout session by purchase/authorize.
    #[arg(long)]
    transaction_id: String,
    #[arg(long)]
    token: String,
    /// Original payment amount, major units.
    #[arg(long)]
    payment_amount: f64,
    /// Amount to refund, major units.
    #[arg(long)]
    amount: f64,
    #[arg(long, default_value = "USD")]
    currency: String,
    #[arg(long)]
    order: Option<String>,
    #[arg(long, default_value = "data/ledger.csv")]
    ledger: PathBuf,
}

#[derive(Parser)]
struct CreditArgs {
    #[arg(long)]
    transaction_id: String,
    #[arg(long)]
    payment_amount: f64,
    #[arg(long)]
    credit_cents: i64,
    #[arg(long, default_value = "USD")]
    currency: String,
}

#[derive(Serialize)]
struct Outcome<'a> {
    operation: &'a str,
    response: &'a GatewayResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a ExpressCheckoutSession>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    logging::init_logging("paypal-express")?;
    let cli = Cli::parse();
    let config = resolve_config(&cli.gateway)?;
    match cli.command {
        Command::CheckoutUrl(args) => run_checkout_url(config, args),
        Command::Setup(args) => run_setup(config, args),
        Command::Details(args) => run_details(config, args),
        Command::Purchase(args) => run_purchase(config, args),
        Command::Authorize(args) => run_authorize(config, args),
        Command::Capture(args) => run_capture(config, args),
        Command::Refund(args) => run_refund(config, args),
        Command::Credit(args) => run_credit(config, args),
    }
}

fn resolve_config(args: &GatewayArgs) -> Result<GatewayConfig, String> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_toml_file(path).map_err(|err| err.to_string())?,
        None => GatewayConfig::default(),
    };
    if let Some(login) = &args.login {
        config.credentials.login = login.clone();
    }
    if let Some(password) = &args.password {
        config.credentials.password = password.clone();
    }
    if let Some(signature) = &args.signature {
        config.credentials.signature = signature.clone();
    }
    if let Some(server) = &args.server {
        config.server = Server::parse(server);
    }
    if args.legacy_layout {
        config.use_new_layout = false;
    }
    log::debug!("gateway config: {:?}", config);
    Ok(config)
}

fn gateway(config: GatewayConfig) -> Result<PayPalExpress, String> {
    PayPalExpress::new(config).map_err(|err| err.to_string())
}

fn run_checkout_url(config: GatewayConfig, args: CheckoutUrlArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let extra: Vec<(&str, &str)> = args
        .params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    println!("{}", gateway.express_checkout_url(&args.token, &extra));
    Ok(())
}

fn run_setup(config: GatewayConfig, args: SetupArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let details = PaymentDetails {
        order_total: BasicAmount::new(&args.currency, args.amount),
        item_total: None,
        shipping_total: None,
        handling_total: None,
        tax_total: None,
        shipping_discount: None,
        order_description: args.description,
        invoice_id: args.invoice,
        custom: None,
        items: Vec::new(),
    };
    let action = match args.action {
        ActionArg::Sale => PaymentAction::Sale,
        ActionArg::Authorization => PaymentAction::Authorization,
    };
    let response = timed("setup", || {
        gateway.setup_checkout(details, &args.return_url, &args.cancel_url, action)
    })?;
    emit_outcome("setup", &response, None)?;
    if let Some(token) = response.transaction_id.as_deref() {
        emit_info_line(&format!(
            "Redirect buyer to {}",
            gateway.express_checkout_url(token, &[])
        ));
    }
    ensure_success("setup", &response)
}

fn run_details(config: GatewayConfig, args: TokenArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let details = timed("details", || gateway.payment_details(&args.token))?;
    let rendered = serde_json::to_string_pretty(&details).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn run_purchase(config: GatewayConfig, args: SessionArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let mut session = ExpressCheckoutSession::with_payer(&args.token, &args.payer_id);
    let response = timed("purchase", || gateway.purchase(args.amount, &mut session))?;
    emit_outcome("purchase", &response, Some(&session))?;
    ensure_success("purchase", &response)
}

fn run_authorize(config: GatewayConfig, args: SessionArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let mut session = ExpressCheckoutSession::with_payer(&args.token, &args.payer_id);
    let response = timed("authorize", || gateway.authorize(args.amount, &mut session))?;
    emit_outcome("authorize", &response, Some(&session))?;
    ensure_success("authorize", &response)
}

fn run_capture(config: GatewayConfig, args: CaptureArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let response = timed("capture", || {
        gateway.capture(args.amount_cents, &args.authorization, &args.currency)
    })?;
    emit_outcome("capture", &response, None)?;
    ensure_success("capture", &response)
}

fn run_refund(config: GatewayConfig, args: RefundArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let mut session = ExpressCheckoutSession::new(&args.token);
    session.transaction_id = Some(args.transaction_id.clone());
    let mut payment = Payment::new(args.payment_amount, &args.currency, session);
    payment.order_id = args.order;
    payment.state = PaymentState::Completed;
    payment.transaction_id = Some(args.transaction_id);

    let mut ledger = CsvLedger::new(args.ledger);
    let response = timed("refund", || gateway.refund(&mut payment, args.amount, &mut ledger))?;
    emit_outcome("refund", &response, Some(&payment.source))?;
    if response.success {
        emit_info_line(&format!(
            "Ledger entry appended to {}",
            ledger.path().display()
        ));
    }
    ensure_success("refund", &response)
}

fn run_credit(config: GatewayConfig, args: CreditArgs) -> Result<(), String> {
    let gateway = gateway(config)?;
    let mut session = ExpressCheckoutSession::default();
    session.transaction_id = Some(args.transaction_id.clone());
    let mut payment = Payment::new(args.payment_amount, &args.currency, session);
    payment.state = PaymentState::Completed;
    payment.transaction_id = Some(args.transaction_id.clone());

    let response = timed("credit", || {
        gateway.credit(args.credit_cents, &args.transaction_id, &mut payment)
    })?;
    emit_outcome("credit", &response, Some(&payment.source))?;
    ensure_success("credit", &response)
}

fn timed<T>(
    label: &str,
    call: impl FnOnce() -> paypal_express::Result<T>,
) -> Result<T, String> {
    let start = Instant::now();
    let result = call().map_err(|err| err.to_string());
    emit_info_line(&format!(
        "{} time: {} ms",
        label,
        start.elapsed().as_millis()
    ));
    result
}

fn emit_outcome(
    operation: &str,
    response: &GatewayResponse,
    session: Option<&ExpressCheckoutSession>,
) -> Result<(), String> {
    let outcome = Outcome {
        operation,
        response,
        session,
    };
    let rendered = serde_json::to_string_pretty(&outcome).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}

fn ensure_success(operation: &str, response: &GatewayResponse) -> Result<(), String> {
    if response.success {
        emit_info_line(&format!("{} succeeded at {}", operation, Utc::now().to_rfc3339()));
        return Ok(());
    }
    Err(format!(
        "{} failed: {}",
        operation,
        response.error_message.as_deref().unwrap_or("no error message")
    ))
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {}", input))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {}", input));
    }
    Ok((key.to_string(), value.to_string()))
}

fn emit_info_line(message: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{}", message);
    } else {
        eprintln!("{message}");
    }
}
