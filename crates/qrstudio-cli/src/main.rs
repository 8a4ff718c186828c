//! QR Studio CLI - styled QR code generator.

mod args;
mod clipboard;
mod commands;

use clap::{Parser, Subcommand};
use qrstudio_core::{ContentRequest, WifiSecurity};
use std::path::PathBuf;

use crate::args::{OutputArgs, StyleArgs};

#[derive(Parser)]
#[command(name = "qrstudio", version)]
#[command(about = "Build styled QR codes for text, links, Wi-Fi, contacts and PIX", long_about = None)]
struct Cli {
    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    style: StyleArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plain text
    Text { text: String },
    /// Link
    Url { url: String },
    /// Phone number (tel:)
    Phone { number: String },
    /// E-mail address (mailto:)
    Email { address: String },
    /// Wi-Fi network credentials
    Wifi {
        #[arg(long)]
        ssid: String,
        #[arg(long, default_value = "")]
        password: String,
        /// wpa, wep or open
        #[arg(long, default_value = "wpa")]
        security: WifiSecurity,
    },
    /// Contact card (vCard 3.0)
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// PIX payment key
    Pix {
        #[arg(long)]
        key: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        city: String,
        /// Optional amount, e.g. 10.50
        #[arg(long, default_value = "")]
        amount: String,
    },
    /// Read a QR code from an image file
    Decode { image: PathBuf },
}

impl Commands {
    fn into_request(self) -> Option<ContentRequest> {
        let request = match self {
            Commands::Text { text } => ContentRequest::PlainText { text },
            Commands::Url { url } => ContentRequest::Url { url },
            Commands::Phone { number } => ContentRequest::Phone { number },
            Commands::Email { address } => ContentRequest::Email { address },
            Commands::Wifi {
                ssid,
                password,
                security,
            } => ContentRequest::WifiCredential {
                ssid,
                password,
                security,
            },
            Commands::Contact { name, phone, email } => {
                ContentRequest::ContactCard { name, phone, email }
            }
            Commands::Pix {
                key,
                name,
                city,
                amount,
            } => ContentRequest::PaymentKey {
                key,
                name,
                city,
                amount,
            },
            Commands::Decode { .. } => return None,
        };
        Some(request)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Decode { image } => commands::decode_image(&image),
        command => {
            let style = cli.style.resolve()?;
            match command.into_request() {
                Some(request) => commands::generate(&request, &style, &cli.output),
                None => Ok(()),
            }
        }
    }
}
