//! Delivery-note signing.
//!
//! Signatures captured on the device are rasterized, returned to the host
//! and kept in a pending list until the host has uploaded them. The note
//! list itself is mock data until a backend exists.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::raster::{rasterize, SignaturePath, StrokeStyle};
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::storage::{JsonSlot, PreferenceStore, SignatureConfig};

pub const NAMESPACE: &str = "DeliveryNotesPrefs";
pub const KEY_PENDING_SIGNATURES: &str = "pending_signatures";

const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryNote {
    pub id: String,
    pub number: String,
    pub project_name: String,
    pub customer_name: String,
    pub status: String,
    pub created_at: i64,
}

/// Stroke input for a signature, as sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureData {
    #[serde(default)]
    pub paths: Vec<SignaturePath>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSignature {
    pub delivery_note_id: String,
    pub signer_name: String,
    pub signature_base64: String,
    pub signed_at: i64,
}

/// Pending signature as listed to the host; image bytes stay local.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSignatureSummary {
    pub delivery_note_id: String,
    pub signer_name: String,
    pub signed_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryNotesList {
    pub delivery_notes: Vec<DeliveryNote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBitmap {
    pub success: bool,
    pub base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signed {
    pub success: bool,
    pub delivery_note_id: String,
    pub signature_base64: String,
    pub signed_at: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSignatures {
    pub pending_signatures: Vec<PendingSignatureSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearedSignatures {
    pub success: bool,
    pub message: String,
}

pub struct DeliveryNotes {
    slot: JsonSlot<Vec<PendingSignature>>,
    clock: Arc<dyn Clock>,
    canvas: SignatureConfig,
}

impl DeliveryNotes {
    pub fn new(store: Arc<dyn PreferenceStore>, clock: Arc<dyn Clock>, canvas: SignatureConfig) -> Self {
        Self {
            slot: JsonSlot::new(store, NAMESPACE, KEY_PENDING_SIGNATURES),
            clock,
            canvas,
        }
    }

    /// Rasterize strokes to a base64 PNG, using the configured canvas size
    /// for missing dimensions.
    pub fn create_bitmap(
        &self,
        paths: &[SignaturePath],
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<SignatureBitmap> {
        Ok(SignatureBitmap {
            success: true,
            base64: self.render_base64(paths, width, height)?,
        })
    }

    pub fn sign(&self, delivery_note_id: &str, signer_name: &str, signature: &SignatureData) -> Result<Signed> {
        if delivery_note_id.trim().is_empty() {
            return Err(ValidationError::Missing("deliveryNoteId").into());
        }
        if signer_name.trim().is_empty() {
            return Err(ValidationError::Missing("signerName").into());
        }

        let signature_base64 = self.render_base64(&signature.paths, signature.width, signature.height)?;
        let signed_at = self.clock.now_ms();

        let guard = self.slot.lock()?;
        let mut pending = guard.load()?;
        pending.push(PendingSignature {
            delivery_note_id: delivery_note_id.to_string(),
            signer_name: signer_name.to_string(),
            signature_base64: signature_base64.clone(),
            signed_at,
        });
        guard.store(&pending)?;

        tracing::info!(delivery_note_id, pending = pending.len(), "delivery note signed");
        Ok(Signed {
            success: true,
            delivery_note_id: delivery_note_id.to_string(),
            signature_base64,
            signed_at,
            message: "Delivery note signed".to_string(),
        })
    }

    pub fn pending_signatures(&self) -> Result<PendingSignatures> {
        let pending = self
            .slot
            .read()?
            .into_iter()
            .map(|s| PendingSignatureSummary {
                delivery_note_id: s.delivery_note_id,
                signer_name: s.signer_name,
                signed_at: s.signed_at,
            })
            .collect();
        Ok(PendingSignatures {
            pending_signatures: pending,
        })
    }

    /// Full pending records, image data included.
    pub fn pending_signature_records(&self) -> Result<Vec<PendingSignature>> {
        Ok(self.slot.read()?)
    }

    pub fn clear_pending_signatures(&self) -> Result<ClearedSignatures> {
        self.slot.lock()?.remove()?;
        tracing::info!("cleared pending signatures");
        Ok(ClearedSignatures {
            success: true,
            message: "Pending signatures cleared".to_string(),
        })
    }

    /// Notes awaiting signature. Static sample data.
    pub fn pending_delivery_notes(&self) -> DeliveryNotesList {
        let now = self.clock.now_ms();
        DeliveryNotesList {
            delivery_notes: vec![
                DeliveryNote {
                    id: "DN-2025-001".into(),
                    number: "DN-2025-001".into(),
                    project_name: "Baustelle Nord".into(),
                    customer_name: "Mustermann GmbH".into(),
                    status: "sent".into(),
                    created_at: now,
                },
                DeliveryNote {
                    id: "DN-2025-002".into(),
                    number: "DN-2025-002".into(),
                    project_name: "Bürogebäude Zentrum".into(),
                    customer_name: "Bau AG".into(),
                    status: "sent".into(),
                    created_at: now - DAY_MS,
                },
            ],
        }
    }

    /// Raw PNG bytes on the configured canvas.
    pub fn render_png(&self, paths: &[SignaturePath], width: Option<u32>, height: Option<u32>) -> Result<Vec<u8>> {
        rasterize(
            paths,
            width.unwrap_or(self.canvas.width),
            height.unwrap_or(self.canvas.height),
            StrokeStyle {
                width: self.canvas.stroke_width,
            },
        )
    }

    fn render_base64(&self, paths: &[SignaturePath], width: Option<u32>, height: Option<u32>) -> Result<String> {
        Ok(STANDARD.encode(self.render_png(paths, width, height)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CoreError;
    use crate::signature::raster::Point;
    use crate::storage::MemoryPreferences;

    fn notes() -> DeliveryNotes {
        DeliveryNotes::new(
            Arc::new(MemoryPreferences::new()),
            Arc::new(ManualClock::new(1_000_000_000)),
            SignatureConfig::default(),
        )
    }

    fn stroke() -> SignatureData {
        SignatureData {
            paths: vec![SignaturePath {
                points: vec![Point { x: 10.0, y: 10.0 }, Point { x: 100.0, y: 50.0 }],
            }],
            width: Some(120),
            height: Some(60),
        }
    }

    #[test]
    fn bitmap_uses_configured_canvas() {
        let bitmap = notes().create_bitmap(&[], None, None).unwrap();
        let png = STANDARD.decode(bitmap.base64).unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!((image.width(), image.height()), (400, 200));
    }

    #[test]
    fn sign_records_pending_signature() {
        let notes = notes();
        let signed = notes.sign("DN-2025-001", "Erika Muster", &stroke()).unwrap();
        assert_eq!(signed.signed_at, 1_000_000_000);
        assert!(!signed.signature_base64.is_empty());

        let pending = notes.pending_signatures().unwrap().pending_signatures;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].delivery_note_id, "DN-2025-001");
        assert_eq!(pending[0].signer_name, "Erika Muster");

        let records = notes.pending_signature_records().unwrap();
        assert_eq!(records[0].signature_base64, signed.signature_base64);
    }

    #[test]
    fn sign_validates_before_storing() {
        let notes = notes();
        assert!(matches!(
            notes.sign("", "Erika", &stroke()),
            Err(CoreError::Validation(ValidationError::Missing("deliveryNoteId")))
        ));
        assert!(matches!(
            notes.sign("DN-1", " ", &stroke()),
            Err(CoreError::Validation(ValidationError::Missing("signerName")))
        ));
        let oversized = SignatureData {
            width: Some(100_000),
            ..stroke()
        };
        assert!(matches!(notes.sign("DN-1", "Erika", &oversized), Err(CoreError::Validation(_))));
        assert!(notes.pending_signatures().unwrap().pending_signatures.is_empty());
    }

    #[test]
    fn clear_removes_all_pending() {
        let notes = notes();
        notes.sign("DN-1", "A", &stroke()).unwrap();
        notes.sign("DN-2", "B", &stroke()).unwrap();
        notes.clear_pending_signatures().unwrap();
        assert!(notes.pending_signatures().unwrap().pending_signatures.is_empty());
    }

    #[test]
    fn mock_notes_are_one_day_apart() {
        let list = notes().pending_delivery_notes().delivery_notes;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].created_at - list[1].created_at, DAY_MS);
        assert_eq!(list[1].customer_name, "Bau AG");
    }

    #[test]
    fn corrupt_pending_blob_aborts_without_mutation() {
        let store = Arc::new(MemoryPreferences::new());
        store.put(NAMESPACE, KEY_PENDING_SIGNATURES, "[{\"deliveryNoteId\":").unwrap();
        let notes = DeliveryNotes::new(
            store.clone(),
            Arc::new(ManualClock::new(1_000_000_000)),
            SignatureConfig::default(),
        );

        assert!(matches!(notes.sign("DN-1", "Max", &stroke()), Err(CoreError::Storage(_))));
        assert!(matches!(notes.pending_signatures(), Err(CoreError::Storage(_))));
        assert_eq!(
            store.get(NAMESPACE, KEY_PENDING_SIGNATURES).unwrap().as_deref(),
            Some("[{\"deliveryNoteId\":")
        );
    }
}
