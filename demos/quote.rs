//! Quote Example
//!
//! Prices a fixture cart and prints the quote.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to apply a coupon code
//! Use `--campus` to deliver to a different campus than the cart fixture names

use std::{io, sync::Arc};

use anyhow::Result;
use clap::Parser;

use campus_cart::{
    config::QuoteArgs,
    coupons::{ApplyOutcome, resolver::CouponResolver},
    fixtures::Fixture,
    logging::init_subscriber,
    quote::{PricingContext, Quote},
};

/// Quote Example
#[tokio::main]
#[expect(clippy::print_stdout, reason = "Example code")]
async fn main() -> Result<()> {
    let args = QuoteArgs::parse();

    init_subscriber(&args.logging)?;

    let fixture = Fixture::load(&args.fixtures_path, &args.fixture)?;
    let resolver = CouponResolver::new(Arc::new(fixture.coupon_store()));
    let cart = fixture.cart();

    if let Some(code) = args.coupon.as_deref() {
        let outcome = ApplyOutcome::from(&resolver.apply_coupon(code, cart.subtotal()).await);

        println!("{}", outcome.message);
    }

    let mut ctx = PricingContext::new(fixture.settings(), fixture.registry());

    if let Some(campus) = args.campus.as_deref().or(fixture.campus()) {
        ctx = ctx.with_campus(campus);
    }

    let quote = Quote::evaluate(cart, &ctx, resolver.active_coupon().as_ref());

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    quote.write_to(&mut handle)?;

    if !quote.can_checkout() {
        println!("\nCheckout is blocked until every minimum order is met.");
    }

    Ok(())
}
