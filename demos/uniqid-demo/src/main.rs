//! UNIQID Demo Application
//!
//! Walks through the identity token lifecycle:
//! - Serial numbering per family
//! - Label fixed by the first token
//! - Duplication that moves the serial
//! - Checked and unchecked access on a dead token
//! - Composed owners with several families
//!
//! Lifecycle events are logged through `tracing`; set `RUST_LOG=debug` to
//! see every create, transfer and drop.

use tracing_subscriber::EnvFilter;
use uniqid_core::{FamilyRegistry, UniqIdError, UniqueId};

struct Composed {
    id: UniqueId<Composed, 201>,
    shared: UniqueId<i32, 1000>,
}

impl Composed {
    fn new() -> Result<Self, UniqIdError> {
        Ok(Composed {
            id: UniqueId::new()?,
            shared: UniqueId::new()?,
        })
    }
}

fn rule() {
    println!("{}", "_".repeat(80));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("starting identity token walkthrough");

    rule();
    println!("Identity token walkthrough");
    rule();

    let mut unique1 = UniqueId::<i32, 1000>::with_label("uniq#")?;
    println!("unique1.id() = {}", unique1.id()?);

    let unique2 = UniqueId::<i32, 1000>::new()?;
    println!("unique2.display_name() = {}", unique2.display_name()?);

    match UniqueId::<i32, 1000>::with_label("change") {
        Ok(token) => println!("unexpected: relabelled as {}", token),
        Err(e) => println!("properly caught: {}", e),
    }

    let mut unique4 = UniqueId::<i32, 1000>::new()?;
    println!("unique4.id() = {}", unique4.id()?);

    let unique5 = UniqueId::<i32, 1>::new()?;
    println!("unique5.id() = {}", unique5.id()?);

    println!("Attempt transfer unique1 -> unique4");
    unique4.transfer_from(&mut unique1);
    println!("Invalidated unique1 {}", unique1.display_name_unchecked());
    println!("unique4 now holds {}", unique4.display_name()?);

    match unique1.id() {
        Ok(id) => println!("unexpected: dead token answered {}", id),
        Err(e) => println!("properly caught: {}", e),
    }

    rule();
    println!("Composed owners");
    rule();

    let composed = (0..3)
        .map(|_| Composed::new())
        .collect::<Result<Vec<_>, _>>()?;
    for (i, item) in composed.iter().enumerate() {
        println!(
            "[{}] id = {}, shared = {}",
            i,
            item.id.id()?,
            item.shared.display_name()?
        );
    }

    if let Some(stats) = FamilyRegistry::global().stats::<i32, 1000>() {
        println!(
            "family i32@1000: issued {}, live {}, next {:?}, label {:?}",
            stats.issued, stats.live_holders, stats.next_serial, stats.label
        );
    }

    rule();
    println!("Done");
    Ok(())
}
