//! Pinpress CLI - storefront and admin operations from the shell
//!
//! Commands: sizes, preview, order, orders, export, complete, report
//! Outputs JSON to stdout, logs to stderr
//! Returns non-zero on failure

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

use pinpress_core::{
    compress::compress_for_order,
    logging::init_logging,
    report,
    AppConfig, Catalog, DirectorySink, JsonOrderStore, MockupRenderer, OrderDraft, OrderFilter,
    OrderForm, OrderStatus, OrderStore, PrintExporter, ProductType,
};

#[derive(Parser)]
#[command(name = "pinpress-cli")]
#[command(about = "Pinpress CLI - pin mockups, orders and print files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the JSON config file
    #[arg(short, long, default_value = "pinpress.json")]
    config: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Product {
    Pin,
    Keychain,
}

impl From<Product> for ProductType {
    fn from(p: Product) -> Self {
        match p {
            Product::Pin => ProductType::Pin,
            Product::Keychain => ProductType::Keychain,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Status {
    Pending,
    Processing,
    Completed,
}

impl From<Status> for OrderStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Pending => OrderStatus::Pending,
            Status::Processing => OrderStatus::Processing,
            Status::Completed => OrderStatus::Completed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available sizes
    Sizes,

    /// Render the mockup preview to a PNG
    Preview {
        /// Size ID
        #[arg(short, long, default_value = "small")]
        size: String,

        /// Source image; omit for the placeholder
        #[arg(short, long)]
        image: Option<PathBuf>,

        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,

        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Place an order
    Order {
        #[arg(short, long)]
        name: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, value_enum, default_value = "pin")]
        product: Product,

        #[arg(short, long, default_value = "small")]
        size: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(short, long)]
        image: PathBuf,

        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,
    },

    /// Show the fulfilment queue, or orders with a given status
    Orders {
        #[arg(long, value_enum)]
        status: Option<Status>,
    },

    /// Write the print file for an order
    Export {
        #[arg(long)]
        id: Uuid,
    },

    /// Mark an order as completed
    Complete {
        #[arg(long)]
        id: Uuid,
    },

    /// Summarise completed orders
    Report {
        /// Directory to write the CSV report into
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn order_summary(order: &pinpress_core::Order) -> serde_json::Value {
    json!({
        "id": order.id,
        "timestamp": order.timestamp,
        "status": order.status,
        "name": order.name(),
        "productType": order.product_type(),
        "size": order.size_details().map(|s| s.label.clone()),
        "quantity": order.quantity(),
        "hasImage": order.image_data().is_some(),
    })
}

fn run(command: Commands, config: &AppConfig) -> Result<serde_json::Value, String> {
    let catalog = Catalog::load_from_dir(&config.catalog_dir).map_err(|e| e.to_string())?;

    match command {
        Commands::Sizes => Ok(json!(catalog.list())),

        Commands::Preview { size, image, scale, x, y, out } => {
            let mut renderer = MockupRenderer::new(catalog, config.print, size);
            if let Some(path) = image {
                let bytes = fs::read(&path).map_err(|e| e.to_string())?;
                if !renderer.load_image(bytes) {
                    return Err(format!("Could not decode {}", path.display()));
                }
                renderer.set_scale(scale);
                let c = config.print.preview_side as f64 / 2.0;
                renderer.pointer_down(c, c);
                renderer.pointer_move(c + x, c + y);
                renderer.pointer_up();
            }
            let frame = renderer.render().ok_or("Unknown size")?;
            frame.image.save(&out).map_err(|e| e.to_string())?;
            Ok(json!({
                "out": out,
                "transform": renderer.transform(),
                "zoom": renderer.zoom_label(),
                "captions": frame.captions,
            }))
        }

        Commands::Order { name, phone, product, size, quantity, image, scale, x, y } => {
            let bytes = fs::read(&image).map_err(|e| e.to_string())?;
            let image_data = compress_for_order(&bytes).map_err(|e| e.to_string())?;
            let form = OrderForm {
                name,
                phone_number: phone,
                product_type: product.into(),
                size,
                quantity,
            };
            let transform = pinpress_core::ImageTransform {
                scale: pinpress_core::geometry::clamp_scale(scale),
                x,
                y,
            };
            let draft = OrderDraft::from_form(form, &catalog, Some(image_data), transform);
            let mut store = JsonOrderStore::open(&config.orders_path).map_err(|e| e.to_string())?;
            let order = store.create_order(draft).map_err(|e| e.to_string())?;
            Ok(order_summary(&order))
        }

        Commands::Orders { status } => {
            let store = JsonOrderStore::open(&config.orders_path).map_err(|e| e.to_string())?;
            let listed: Vec<_> = match status {
                Some(s) => store
                    .list_orders(Some(OrderFilter::status(s.into())))
                    .map_err(|e| e.to_string())?
                    .iter()
                    .map(order_summary)
                    .collect(),
                None => {
                    let all = store.list_orders(None).map_err(|e| e.to_string())?;
                    report::queue(&all).into_iter().map(order_summary).collect()
                }
            };
            Ok(json!(listed))
        }

        Commands::Export { id } => {
            let store = JsonOrderStore::open(&config.orders_path).map_err(|e| e.to_string())?;
            let order = store.get_order(id).map_err(|e| e.to_string())?;
            let exporter = PrintExporter::new(config.print);
            let mut sink = DirectorySink::new(&config.output_dir);
            match exporter.export_to(&order, &mut sink).map_err(|e| e.to_string())? {
                Some(path) => Ok(json!({ "exported": true, "path": path })),
                None => Ok(json!({ "exported": false, "reason": "order has no image" })),
            }
        }

        Commands::Complete { id } => {
            let mut store = JsonOrderStore::open(&config.orders_path).map_err(|e| e.to_string())?;
            store.update_status(id, OrderStatus::Completed).map_err(|e| e.to_string())?;
            Ok(json!({ "id": id, "status": OrderStatus::Completed }))
        }

        Commands::Report { csv } => {
            let store = JsonOrderStore::open(&config.orders_path).map_err(|e| e.to_string())?;
            let all = store.list_orders(None).map_err(|e| e.to_string())?;
            let done = report::completed(&all);
            let summary = report::summarize(&done);
            let written = match csv {
                Some(dir) => {
                    fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
                    let path = dir.join(report::report_filename(chrono::Local::now().date_naive()));
                    let file = fs::File::create(&path).map_err(|e| e.to_string())?;
                    report::write_csv(&done, file).map_err(|e| e.to_string())?;
                    Some(path)
                }
                None => None,
            };
            Ok(json!({ "summary": summary, "csv": written }))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to load config: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.logging);

    match run(cli.command, &config) {
        Ok(output) => {
            let output = json!({ "success": true, "result": output });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            let output = json!({ "success": false, "error": e });
            println!("{}", serde_json::to_string(&output).unwrap_or_default());
            ExitCode::from(2)
        }
    }
}
