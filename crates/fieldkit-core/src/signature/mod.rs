//! DeliveryNotes plugin: signature rasterization and delivery-note signing.

mod delivery;
pub mod raster;

pub use delivery::{
    ClearedSignatures, DeliveryNote, DeliveryNotes, DeliveryNotesList, PendingSignature,
    PendingSignatureSummary, PendingSignatures, SignatureBitmap, SignatureData, Signed,
    KEY_PENDING_SIGNATURES, NAMESPACE,
};
pub use raster::{rasterize, Point, SignaturePath, StrokeStyle, MAX_DIMENSION};
