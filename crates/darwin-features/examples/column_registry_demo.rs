//! Demonstration of the Darwin column registry
//!
//! This example shows how to:
//! - List every feature and outcome family
//! - Look up metadata for a concrete column name
//! - Build feature and outcome sets from column names
//!
//! Run with: cargo run --example column_registry_demo -p darwin-features

use darwin_features::{
    ColumnInfo, FeatureSet, OutcomeSet, available_features, available_outcomes, get_column_info,
};

fn print_family(title: &str, columns: &[ColumnInfo]) {
    println!("{}", title);
    println!("{}", "-".repeat(title.len()));
    for info in columns {
        println!("  {:18} {}", info.pattern(), info.description);
    }
    println!();
}

fn main() {
    println!("Darwin Column Registry Demo");
    println!("===========================\n");

    print_family("Features", &available_features());
    print_family("Outcomes", &available_outcomes());

    for name in ["close_chg_5d", "vol_fwd_20d", "market_cap"] {
        match get_column_info(name) {
            Some(info) => println!(
                "{:14} -> {:?}, reads {:?}",
                name, info.kind, info.required_columns
            ),
            None => println!("{:14} -> not a known column", name),
        }
    }
    println!();

    let features = FeatureSet::standard();
    println!(
        "Standard features ({}, max lookback {}): {:?}",
        features.len(),
        features.max_lookback(),
        features.names()
    );

    let outcomes = OutcomeSet::standard();
    println!(
        "Standard outcomes (max horizon {}): {:?}",
        outcomes.max_horizon(),
        outcomes.names()
    );

    match FeatureSet::from_names(&["close_chg_10d", "rel_volume_5d", "close_chg_10d"]) {
        Ok(set) => println!("Parsed: {:?}", set.names()),
        Err(e) => println!("Rejected custom set: {}", e),
    }
}
