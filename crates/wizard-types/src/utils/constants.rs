//! Business limits enforced by the wizard's guards.

/// Item quantity range.
pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 1000;

/// Minimum item name length in characters.
pub const MIN_ITEM_NAME_LEN: usize = 2;

/// Wear levels offered by the characteristics step, in percent.
pub const WEAR_LEVELS: [u8; 5] = [0, 10, 30, 50, 75];

pub const MAX_DEFECT_NOTES_LEN: usize = 500;
pub const MAX_NO_GUARANTEE_REASON_LEN: usize = 200;

pub const MAX_PHOTOS_PER_ITEM: usize = 5;
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_TOTAL_PHOTO_BYTES: u64 = 25 * 1024 * 1024;
pub const PHOTO_CONTENT_TYPES: [&str; 6] = [
	"image/jpeg",
	"image/jpg",
	"image/png",
	"image/gif",
	"image/bmp",
	"image/webp",
];

pub const MAX_MODIFIERS_PER_ITEM: usize = 10;

pub const MIN_TAG_LEN: usize = 3;
pub const MAX_TAG_LEN: usize = 20;
pub const MAX_RECEIPT_NUMBER_LEN: usize = 50;

pub const MAX_ORDER_NOTES_LEN: usize = 1000;

/// Upper bound of a custom discount, in percent.
pub const MAX_CUSTOM_DISCOUNT_PERCENT: u32 = 100;
