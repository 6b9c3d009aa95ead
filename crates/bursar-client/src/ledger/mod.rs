mod post;

pub use post::{PostedLine, PostedPurchase, PurchaseInput, SplitInput, post_purchase};
