//! `procure` command line

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dialoguer::{Confirm, Password};
use rust_decimal::Decimal;
use shared::types::parse_decimal_input;
use shared::{DocumentSlot, LineItem};
use uuid::Uuid;

use procurement_client::confirm::{AutoConfirm, ConfirmPrompt, Confirmer};
use procurement_client::error::{AppError, AppResult};
use procurement_client::gateway::{Notice, NoticeLevel, UploadFile};
use procurement_client::services::{
    AuthService, InventoryRequestInput, LinePrice, QuotationUpdate,
};
use procurement_client::{Orchestrator, Stage};

#[derive(Parser, Debug)]
#[command(name = "procure", version, about = "Procurement workflow: IRR to RPQ to PO")]
pub struct Cli {
    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show stage counts
    Status,
    /// Inventory requests
    #[command(subcommand)]
    Irr(IrrCommand),
    /// Product quotations
    #[command(subcommand)]
    Rpq(RpqCommand),
    /// List suppliers
    Suppliers,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, env = "PROCURE_EMAIL")]
    pub email: String,
    /// Prompted for when omitted
    #[arg(long, env = "PROCURE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum IrrCommand {
    List,
    /// Create a request; items as PRODUCT_ID:NAME:QTY
    Create {
        #[arg(long)]
        supplier: Uuid,
        #[arg(long = "item", required = true, value_parser = parse_item)]
        items: Vec<LineItem>,
        #[arg(long)]
        remarks: Option<String>,
    },
    Delete { id: Uuid },
    /// Create the quotation for a pending request
    Proceed { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum RpqCommand {
    List,
    Show { id: Uuid },
    /// Set the unit price of one line (1-based)
    Price {
        id: Uuid,
        #[arg(long)]
        line: usize,
        #[arg(long, value_parser = parse_price)]
        price: Decimal,
    },
    /// Set the initial payment percentage; blank clears it
    Payment { id: Uuid, percent: String },
    LeadTime {
        id: Uuid,
        days: i32,
        #[arg(long)]
        remarks: Option<String>,
    },
    Upload {
        id: Uuid,
        #[arg(long, value_parser = parse_slot)]
        slot: DocumentSlot,
        file: PathBuf,
    },
    Confirm { id: Uuid },
    /// Create the missing purchase order of a confirmed quotation
    RetryPo { id: Uuid },
    Delete { id: Uuid },
}

fn parse_item(raw: &str) -> Result<LineItem, String> {
    let mut parts = raw.splitn(3, ':');
    let (Some(id), Some(name), Some(qty)) = (parts.next(), parts.next(), parts.next()) else {
        return Err("expected PRODUCT_ID:NAME:QTY".to_string());
    };
    let product_id = id.trim().parse::<Uuid>().map_err(|e| e.to_string())?;
    let quantity = qty.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(LineItem::new(product_id, name.trim(), quantity))
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    parse_decimal_input(raw).ok_or_else(|| format!("invalid amount: {}", raw))
}

fn parse_slot(raw: &str) -> Result<DocumentSlot, String> {
    raw.parse().map_err(|e: &str| e.to_string())
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Asks on the terminal
pub struct ConsoleConfirmer;

impl Confirmer for ConsoleConfirmer {
    fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let mut text = format!("{}: {}", prompt.title, prompt.message);
        if let Some(warning) = &prompt.warning {
            text.push_str(&format!(" {}", warning));
        }
        Confirm::new()
            .with_prompt(text)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

pub fn print_notice(notice: &Notice) {
    let label = match notice.level {
        NoticeLevel::Error => "error",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Info | NoticeLevel::Progress => "note",
    };
    eprintln!("{}: {}", label, notice.message);
    for detail in &notice.details {
        eprintln!("  - {}", detail);
    }
}

pub async fn run(cli: Cli, orchestrator: &mut Orchestrator, auth: &AuthService) -> AppResult<()> {
    let confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(ConsoleConfirmer)
    };

    match cli.command {
        Command::Login(args) => {
            let password = match args.password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt("Password")
                    .interact()
                    .map_err(|e| AppError::Internal(e.to_string()))?,
            };
            let session = auth.login(&args.email, &password).await?;
            match session.user {
                Some(user) => println!("Signed in as {}", user.name),
                None => println!("Signed in"),
            }
        }
        Command::Logout => {
            auth.logout()?;
            println!("Signed out");
        }
        Command::Status => {
            orchestrator.reload().await?;
            orchestrator.refresh_purchase_order_counts().await?;
            let counts = orchestrator.counts();
            println!("{:<20} {}", Stage::Irr, counts.pending_irr);
            println!("{:<20} {}", Stage::Rpq, counts.open_rpq);
            println!(
                "{:<20} {} ({} awaiting payment)",
                Stage::Po,
                counts.pending_orders,
                counts.pending_payments
            );
        }
        Command::Irr(command) => run_irr(command, orchestrator, confirmer.as_ref()).await?,
        Command::Rpq(command) => run_rpq(command, orchestrator, confirmer.as_ref()).await?,
        Command::Suppliers => {
            for supplier in orchestrator.supplier_service().list().await? {
                println!(
                    "{}  {:<30} {:?}  {:?}",
                    supplier.id, supplier.name, supplier.supplier_type, supplier.payment_method
                );
            }
        }
    }

    orchestrator.process_pending_events().await?;
    Ok(())
}

async fn run_irr(
    command: IrrCommand,
    orchestrator: &Orchestrator,
    confirmer: &dyn Confirmer,
) -> AppResult<()> {
    let service = orchestrator.inventory_request_service();
    match command {
        IrrCommand::List => {
            for request in service.list().await? {
                println!(
                    "{}  {}  {:<18} {} item(s), qty {}",
                    request.id,
                    request.control_number,
                    request.status,
                    request.items.len(),
                    request.total_quantity()
                );
            }
        }
        IrrCommand::Create {
            supplier,
            items,
            remarks,
        } => {
            let input = InventoryRequestInput {
                supplier_id: Some(supplier),
                items,
                remarks,
            };
            let created = service.create_batch(&input).await?;
            println!("Created {} ({})", created.control_number, created.id);
        }
        IrrCommand::Delete { id } => {
            service.delete(id, confirmer).await?;
            println!("Deleted");
        }
        IrrCommand::Proceed { id } => {
            let rpq_id = service.proceed_to_rpq(id).await?;
            println!("Quotation {} ready for pricing", rpq_id);
        }
    }
    Ok(())
}

async fn run_rpq(
    command: RpqCommand,
    orchestrator: &Orchestrator,
    confirmer: &dyn Confirmer,
) -> AppResult<()> {
    let service = orchestrator.quotation_service();
    match command {
        RpqCommand::List => {
            for quotation in service.list().await? {
                println!(
                    "{}  {}  {:<10} {:<24} total {}",
                    quotation.id,
                    quotation.control_number,
                    quotation.status,
                    quotation.supplier.name,
                    quotation.grand_total()
                );
            }
        }
        RpqCommand::Show { id } => {
            let quotation = service.get(id).await?;
            println!("{} [{}]", quotation.control_number, quotation.status);
            println!("Supplier: {}", quotation.supplier.name);
            for (index, item) in quotation.items.iter().enumerate() {
                println!(
                    "  {}. {:<30} {:>6} {} x {} = {}",
                    index + 1,
                    item.display_label(),
                    item.quantity,
                    item.unit,
                    item.unit_price.map_or("-".to_string(), |p| p.to_string()),
                    item.total_amount.map_or("-".to_string(), |t| t.to_string())
                );
            }
            println!("Grand total: {}", quotation.grand_total());
            let split = quotation.payment_split();
            if let (Some(ip), Some(fp)) = (split.initial_percent, split.final_percent) {
                println!(
                    "Payment: {}% / {}% ({} / {})",
                    ip,
                    fp,
                    split.initial_amount.unwrap_or_default(),
                    split.final_amount.unwrap_or_default()
                );
            }
            for (slot, document) in quotation.documents.filled() {
                println!("  {}: {}", slot, document.url);
            }
            for missing in quotation.confirmation_gaps() {
                println!("  missing: {}", missing);
            }
        }
        RpqCommand::Price { id, line, price } => {
            if line == 0 {
                return Err(AppError::validation("line", "Lines are numbered from 1"));
            }
            let update = QuotationUpdate {
                prices: vec![LinePrice {
                    line: line - 1,
                    unit_price: Some(price),
                }],
                ..Default::default()
            };
            let saved = service.update(id, &update).await?;
            println!("Grand total: {}", saved.grand_total());
        }
        RpqCommand::Payment { id, percent } => {
            let update = QuotationUpdate {
                initial_payment_percent: Some(percent),
                ..Default::default()
            };
            let saved = service.update(id, &update).await?;
            let split = saved.payment_split();
            println!(
                "Initial {} / final {}",
                split.initial_amount.unwrap_or_default(),
                split.final_amount.unwrap_or_default()
            );
        }
        RpqCommand::LeadTime { id, days, remarks } => {
            let update = QuotationUpdate {
                production_lead_time_days: Some(days),
                production_remarks: remarks,
                ..Default::default()
            };
            service.update(id, &update).await?;
            println!("Lead time set to {} day(s)", days);
        }
        RpqCommand::Upload { id, slot, file } => {
            let bytes = std::fs::read(&file)
                .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", file.display(), e)))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload")
                .to_string();
            let upload = UploadFile::new(file_name, content_type_for(&file), bytes);
            let document = service.upload_document(id, slot, upload).await?;
            println!("Attached {} as {}", document.url, slot);
        }
        RpqCommand::Confirm { id } => {
            let order = service.confirm(id).await?;
            println!(
                "Confirmed; purchase order {}",
                order.po_number.unwrap_or_else(|| order.id.to_string())
            );
        }
        RpqCommand::RetryPo { id } => {
            let quotation = service.get(id).await?;
            let order = orchestrator
                .purchase_order_service()
                .retry_from_quotation(&quotation)
                .await?;
            println!(
                "Purchase order {}",
                order.po_number.unwrap_or_else(|| order.id.to_string())
            );
        }
        RpqCommand::Delete { id } => {
            service.delete(id, confirmer).await?;
            println!("Deleted quotation and its inventory request");
        }
    }
    Ok(())
}
