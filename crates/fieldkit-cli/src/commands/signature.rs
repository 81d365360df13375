use std::path::PathBuf;

use clap::Subcommand;
use fieldkit_core::{CoreError, SignatureData, SignaturePath, ValidationError};
use serde_json::json;

use super::{open_bridge, parse_json_arg, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SignatureAction {
    /// Rasterize strokes to a PNG
    Render {
        /// Paths as JSON, e.g. '[{"points":[{"x":1,"y":1},{"x":9,"y":9}]}]'
        paths: String,
        /// Canvas width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Canvas height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Write the PNG to a file instead of printing base64
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Sign a delivery note
    Sign {
        /// Delivery note ID
        delivery_note_id: String,
        /// Name of the person signing
        signer_name: String,
        /// Paths as JSON
        paths: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
    },
    /// List delivery notes awaiting signature
    Notes,
    /// List signatures not yet uploaded
    Pending,
    /// Drop all pending signatures
    Clear,
}

pub fn run(action: SignatureAction) -> CmdResult {
    let bridge = open_bridge()?;
    let delivery = bridge.delivery();
    match action {
        SignatureAction::Render {
            paths,
            width,
            height,
            output,
        } => {
            let paths = parse_paths(&paths)?;
            match output {
                Some(path) => {
                    let png = delivery.render_png(&paths, width, height)?;
                    std::fs::write(&path, &png)?;
                    print_json(&json!({
                        "success": true,
                        "path": path.display().to_string(),
                        "bytes": png.len(),
                    }))
                }
                None => print_json(&delivery.create_bitmap(&paths, width, height)?),
            }
        }
        SignatureAction::Sign {
            delivery_note_id,
            signer_name,
            paths,
            width,
            height,
        } => {
            let signature = SignatureData {
                paths: parse_paths(&paths)?,
                width,
                height,
            };
            print_json(&delivery.sign(&delivery_note_id, &signer_name, &signature)?)
        }
        SignatureAction::Notes => print_json(&delivery.pending_delivery_notes()),
        SignatureAction::Pending => print_json(&delivery.pending_signatures()?),
        SignatureAction::Clear => print_json(&delivery.clear_pending_signatures()?),
    }
}

fn parse_paths(raw: &str) -> Result<Vec<SignaturePath>, CoreError> {
    let value = parse_json_arg("paths", raw)?;
    serde_json::from_value(value).map_err(|e| {
        ValidationError::InvalidValue {
            field: "paths",
            message: e.to_string(),
        }
        .into()
    })
}
