//! Command-line entry point: runs the federation flow once and prints the credentials.

// std
use std::sync::Arc;
// crates.io
use clap::{Parser, ValueEnum};
use color_eyre::{Result, owo_colors::OwoColorize};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;
// self
use onelogin_sts::{
	auth::AppId,
	config::{AppConfig, FlowConfig, ProviderConfig},
	flows::Broker,
	sts::{CloudCredentials, DEFAULT_STS_REGION, DurationDowngrade, StsRoleAssumer},
	terminal::ConsoleTerminal,
	url::Url,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
	/// OneLogin API region.
	#[arg(long, env = "ONELOGIN_REGION", default_value = "us")]
	region: String,
	/// OneLogin account subdomain.
	#[arg(long, env = "ONELOGIN_SUBDOMAIN")]
	subdomain: String,
	/// API client identifier.
	#[arg(long, env = "ONELOGIN_CLIENT_ID")]
	client_id: String,
	/// API client secret.
	#[arg(long, env = "ONELOGIN_CLIENT_SECRET", hide_env_values = true)]
	client_secret: String,
	/// Username; prompted for when absent.
	#[arg(long, env = "ONELOGIN_USERNAME")]
	username: Option<String>,
	/// SAML application identifier.
	#[arg(long, env = "ONELOGIN_APP_ID")]
	app_id: String,
	/// Requested session duration in seconds.
	#[arg(long, env = "ONELOGIN_DURATION", default_value_t = FlowConfig::FALLBACK_DURATION_SECONDS)]
	duration: i32,
	/// Role to assume when the assertion grants several.
	#[arg(long, env = "ONELOGIN_ROLE_ARN")]
	role_arn: Option<String>,
	/// AWS region used for the STS call.
	#[arg(long, env = "AWS_REGION", default_value = DEFAULT_STS_REGION)]
	aws_region: String,
	/// Custom STS endpoint.
	#[arg(long, env = "ONELOGIN_STS_ENDPOINT")]
	sts_endpoint: Option<Url>,
	/// Custom OneLogin API base.
	#[arg(long, env = "ONELOGIN_API_BASE")]
	api_base: Option<Url>,
	/// Output format.
	#[arg(long, value_enum, default_value_t = Format::Env)]
	format: Format,
}
impl Cli {
	fn provider(&self) -> Result<ProviderConfig> {
		let mut builder = ProviderConfig::builder(&self.region)
			.subdomain(&self.subdomain)
			.client_id(&self.client_id)
			.client_secret(&self.client_secret);

		if let Some(username) = &self.username {
			builder = builder.username(username);
		}
		if let Some(base) = &self.api_base {
			builder = builder.api_base(base.clone());
		}

		Ok(builder.build()?)
	}

	fn app(&self) -> Result<AppConfig> {
		let app = AppConfig::new(AppId::new(&self.app_id)?);

		Ok(match &self.role_arn {
			Some(arn) => app.with_preferred_role_arn(arn),
			None => app,
		})
	}
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
	/// Shell `export` lines.
	Env,
	/// JSON object.
	Json,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();

	let cli = Cli::parse();
	let broker = Broker::onelogin(
		cli.provider()?,
		cli.app()?,
		FlowConfig::new(cli.duration)?,
		Arc::new(StsRoleAssumer::new(&cli.aws_region, cli.sts_endpoint.as_ref())),
		Arc::new(ConsoleTerminal::default()),
	)?;
	let exchange = broker.exchange_credentials().await?;

	if let Some(downgrade) = &exchange.downgrade {
		eprintln!("{}", downgrade_notice(downgrade).yellow());
	}

	print(&exchange.credentials, cli.format)
}

fn downgrade_notice(downgrade: &DurationDowngrade) -> String {
	format!(
		"The requested session duration of {}s exceeds the role maximum; credentials were issued for {}s instead.",
		downgrade.requested_seconds, downgrade.granted_seconds
	)
}

fn print(credentials: &CloudCredentials, format: Format) -> Result<()> {
	match format {
		Format::Env => {
			println!("export AWS_ACCESS_KEY_ID={}", credentials.access_key_id);
			println!("export AWS_SECRET_ACCESS_KEY={}", credentials.secret_access_key.expose());
			println!("export AWS_SESSION_TOKEN={}", credentials.session_token.expose());
			println!("# Expires at {}.", credentials.expiration.format(&Rfc3339)?);
		},
		Format::Json => println!("{}", serde_json::to_string_pretty(credentials)?),
	}

	Ok(())
}
