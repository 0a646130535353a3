//! Checkout
//!
//! Customer details, the order record handed to the messaging link, and the
//! submit flow. Submitting re-validates the active coupon against the coupon
//! store; that check is authoritative, unlike the pre-check run when the coupon
//! was applied.

use std::{
    fmt, fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cart::Cart,
    coupons::{
        Coupon,
        resolver::CouponResolver,
        store::{CouponRedeemer, RedemptionError},
    },
    items::{Amount, ItemId, LineItem, RestaurantId},
    minimum_order::Shortfall,
    money::format_amount,
    quote::{PricingContext, Quote},
};

/// File the customer details are stored in, inside the directory given to [`DetailsStore::in_dir`].
pub const DETAILS_FILE_NAME: &str = "campus-cart.details.json";

/// Contact and delivery details entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDetails {
    /// Customer name
    pub name: String,

    /// Contact phone number
    pub phone: String,

    /// Campus id or name
    pub campus: String,

    /// Room, hostel or street address
    pub address: String,

    /// Free-form delivery notes
    pub notes: String,
}

impl CustomerDetails {
    /// Whether every required field has a value. Notes are optional.
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.phone, &self.campus, &self.address]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Errors reading or writing stored customer details.
#[derive(Debug, Error)]
pub enum DetailsError {
    /// The file could not be read or written.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The file does not hold valid details.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Customer details kept in a JSON file between sessions.
#[derive(Debug, Clone)]
pub struct DetailsStore {
    path: PathBuf,
}

impl DetailsStore {
    /// Store details as [`DETAILS_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(DETAILS_FILE_NAME),
        }
    }

    /// Location of the details file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved details, `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`DetailsError`] if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<CustomerDetails>, DetailsError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Save details, replacing anything saved before.
    ///
    /// # Errors
    ///
    /// Returns a [`DetailsError`] if the file cannot be written.
    pub fn save(&self, details: &CustomerDetails) -> Result<(), DetailsError> {
        fs::write(&self.path, serde_json::to_vec_pretty(details)?)?;

        Ok(())
    }

    /// Forget saved details.
    ///
    /// # Errors
    ///
    /// Returns a [`DetailsError`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), DetailsError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// One line of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Item id
    pub item_id: ItemId,

    /// Display name
    pub name: String,

    /// Restaurant the item is ordered from
    pub restaurant: Option<RestaurantId>,

    /// Units ordered
    pub quantity: u32,

    /// Unit price
    pub price: Amount,

    /// Unit price multiplied by quantity
    pub line_total: Amount,
}

impl From<&LineItem> for OrderLine {
    fn from(item: &LineItem) -> Self {
        Self {
            item_id: item.id().clone(),
            name: item.name().to_string(),
            restaurant: item.restaurant().cloned(),
            quantity: item.quantity(),
            price: item.price(),
            line_total: item.line_total(),
        }
    }
}

/// A submitted order as persisted by an [`OrderSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Ordered lines
    pub lines: Vec<OrderLine>,

    /// Delivery details
    pub customer: CustomerDetails,

    /// Sum of line totals
    pub subtotal: Amount,

    /// Delivery charge
    pub delivery_charge: Amount,

    /// Coupon discount
    pub discount: Amount,

    /// Amount payable
    pub total: Amount,

    /// Redeemed coupon, if any
    pub coupon_code: Option<String>,
}

impl OrderRecord {
    /// Build the record for a cart and its final quote.
    pub fn new(cart: &Cart, customer: &CustomerDetails, quote: &Quote) -> Self {
        Self {
            lines: cart.iter().map(OrderLine::from).collect(),
            customer: customer.clone(),
            subtotal: quote.subtotal(),
            delivery_charge: quote.delivery_charge(),
            discount: quote.discount(),
            total: quote.total(),
            coupon_code: quote.coupon_code().map(str::to_string),
        }
    }

    /// Plain-text summary handed to the messaging deep link.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OrderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let customer = &self.customer;

        writeln!(f, "New order from {} ({})", customer.name, customer.phone)?;
        writeln!(f, "Campus: {}", customer.campus)?;
        writeln!(f, "Address: {}", customer.address)?;
        writeln!(f)?;

        for line in &self.lines {
            writeln!(
                f,
                "{} x {} = {}",
                line.quantity,
                line.name,
                format_amount(line.line_total)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Subtotal: {}", format_amount(self.subtotal))?;
        writeln!(f, "Delivery: {}", format_amount(self.delivery_charge))?;

        if let Some(code) = &self.coupon_code {
            writeln!(f, "Discount ({code}): -{}", format_amount(self.discount))?;
        }

        write!(f, "Total: {}", format_amount(self.total))?;

        if !customer.notes.trim().is_empty() {
            write!(f, "\nNotes: {}", customer.notes.trim())?;
        }

        Ok(())
    }
}

/// Order persistence failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderSinkError {
    /// The order could not be stored.
    #[error("order store unavailable: {0}")]
    Unavailable(String),
}

/// Destination for submitted orders.
#[automock]
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Store a submitted order.
    async fn persist(&self, order: OrderRecord) -> Result<(), OrderSinkError>;
}

/// Reasons checkout is blocked.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("Your cart is empty")]
    EmptyCart,

    /// A required delivery detail is missing.
    #[error("Please complete your delivery details")]
    IncompleteDetails,

    /// At least one restaurant is below its minimum order amount.
    #[error("{}", shortfall_message(.0))]
    MinimumOrderNotMet(Vec<Shortfall>),

    /// The coupon store rejected the coupon; it has been removed from the cart.
    #[error("{}", rejected_coupon_message(.code, .reason))]
    CouponRejected {
        /// Coupon code
        code: String,

        /// Store verdict
        reason: RedemptionError,
    },

    /// The coupon could not be verified; it is still applied.
    #[error("Could not verify coupon {code} right now, please try again")]
    CouponUnavailable {
        /// Coupon code
        code: String,
    },
}

fn shortfall_message(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|shortfall| {
            format!(
                "Add {} more from {}",
                format_amount(shortfall.shortfall),
                shortfall.restaurant_name
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn rejected_coupon_message(code: &str, reason: &RedemptionError) -> String {
    match reason {
        RedemptionError::ResourceExhausted => {
            format!("Coupon {code} has reached its usage limit and was removed")
        }
        _ => format!("Coupon {code} is no longer valid and was removed"),
    }
}

/// A successfully submitted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    /// Persisted record
    pub order: OrderRecord,

    /// Plain-text summary for the messaging deep link
    pub message: String,
}

/// Submits carts once the coupon store has confirmed the active coupon.
#[derive(Clone)]
pub struct Checkout {
    redeemer: Arc<dyn CouponRedeemer>,
    sink: Arc<dyn OrderSink>,
}

impl Checkout {
    /// Create a checkout over a coupon redeemer and an order sink.
    pub fn new(redeemer: Arc<dyn CouponRedeemer>, sink: Arc<dyn OrderSink>) -> Self {
        Self { redeemer, sink }
    }

    /// Validate and submit a cart.
    ///
    /// The active coupon is redeemed first. When the store rejects it outright the
    /// coupon is removed from `coupons`; a transient failure leaves it applied so
    /// the customer can retry. Persisting the order happens last, and a failure
    /// there is logged without failing the checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] describing why the order was not submitted.
    #[tracing::instrument(name = "checkout.submit", skip_all, fields(lines = cart.len()))]
    pub async fn submit(
        &self,
        cart: &Cart,
        ctx: &PricingContext<'_>,
        details: &CustomerDetails,
        coupons: &CouponResolver,
    ) -> Result<SubmittedOrder, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if !details.is_complete() {
            return Err(CheckoutError::IncompleteDetails);
        }

        let active = coupons.active_coupon();
        let quote = Quote::evaluate(cart, ctx, active.as_ref());

        if !quote.can_checkout() {
            return Err(CheckoutError::MinimumOrderNotMet(quote.shortfalls().to_vec()));
        }

        let redeemed = match active {
            Some(coupon) => Some(self.redeem(&coupon.code, quote.subtotal(), coupons).await?),
            None => None,
        };

        let quote = Quote::evaluate(cart, ctx, redeemed.as_ref());
        let order = OrderRecord::new(cart, details, &quote);
        let message = order.message();

        if let Err(err) = self.sink.persist(order.clone()).await {
            warn!(error = %err, "failed to persist order");
        }

        info!(total = order.total, coupon = ?order.coupon_code, "submitted order");

        Ok(SubmittedOrder { order, message })
    }

    async fn redeem(
        &self,
        code: &str,
        subtotal: Amount,
        coupons: &CouponResolver,
    ) -> Result<Coupon, CheckoutError> {
        match self.redeemer.redeem(code, subtotal).await {
            Ok(coupon) => Ok(coupon),
            Err(reason) if reason.removes_coupon() => {
                warn!(%code, error = %reason, "coupon rejected at checkout, removing it");

                coupons.remove_coupon();

                Err(CheckoutError::CouponRejected {
                    code: code.to_string(),
                    reason,
                })
            }
            Err(reason) => {
                warn!(%code, error = %reason, "coupon could not be verified");

                Err(CheckoutError::CouponUnavailable {
                    code: code.to_string(),
                })
            }
        }
    }
}

impl fmt::Debug for Checkout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout").finish_non_exhaustive()
    }
}
