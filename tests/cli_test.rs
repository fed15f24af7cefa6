use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;
use tokenshop::domain::address::Address;

const MINT: &str = "AsjP9VyKUSuLSeycoTb9AqGs3PH6BWAvqDoKmxrWpump";
const OWNER: &str = "3H4YYu3SmkpBc4uy614aYjW7rt4nRBEQ8P3rKeFMMzyw";

/// The binary with no backend and an unreachable price oracle.
fn shop() -> Command {
    let mut cmd = Command::new(cargo_bin!());
    cmd.env_remove("SUPABASE_URL")
        .env_remove("SUPABASE_ANON_KEY")
        .env_remove("LANGUAGE")
        .env("TOKEN_MINT", MINT)
        .env("TOKEN_SYMBOL", "MEMEXSOL")
        .env("PRICE_ORACLE_URL", "http://127.0.0.1:9/pools/none")
        .env("RUST_LOG", "tokenshop=info");
    cmd
}

#[test]
fn test_token_account() -> Result<(), Box<dyn std::error::Error>> {
    let owner: Address = OWNER.parse()?;
    let expected = Address::associated_token_address(&owner, &MINT.parse()?)?;

    shop()
        .args(["token-account", OWNER])
        .assert()
        .success()
        .stdout(format!("{expected}\n"));

    Ok(())
}

#[test]
fn test_invalid_address_is_rejected() {
    shop()
        .args(["token-account", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid address"));
}

#[test]
fn test_template() {
    shop()
        .args(["products", "template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "name,product_code,barcode,price_usd,cost_usd,image,category,description,stock\n",
        ))
        .stdout(predicate::str::contains("PRD-001234"));
}

#[test]
fn test_import_with_fallback_price() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "name,product_code,price_usd,image,category,description,stock")?;
    writeln!(file, "Serum,PRD-1,2.5,,skincare,Glow,5")?;
    writeln!(file, "Candle,PRD-2,8,,candles,Warm,1")?;
    file.flush()?;

    shop()
        .args(["products", "import", "--dry-run"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 valid products, 1 errors"))
        .stderr(predicate::str::contains("Row 3: Invalid category \"candles\""))
        .stderr(predicate::str::contains("WARNING"));

    shop()
        .args(["products", "import"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 products, 1 errors"));

    Ok(())
}

#[test]
fn test_missing_import_headers() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "name,price_usd")?;
    writeln!(file, "Serum,2.5")?;
    file.flush()?;

    shop()
        .args(["products", "import"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required headers"));

    Ok(())
}

#[test]
fn test_convert_uses_fallback_price() {
    shop()
        .args(["convert", "10"])
        .assert()
        .success()
        .stdout("10,000.00 MEMEXSOL\n");

    shop()
        .args(["convert", "10000", "--to-usd"])
        .assert()
        .success()
        .stdout("$10.00\n");
}

#[test]
fn test_demo_settings_and_categories() {
    shop()
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shipping_cost\t25.00 MEMEXSOL"))
        .stdout(predicate::str::contains("free_shipping_threshold\t500.00 MEMEXSOL"));

    shop()
        .args(["categories", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skincare"))
        .stdout(predicate::str::contains("fragrance"));
}

#[test]
fn test_unknown_order_status() {
    shop()
        .args(["orders", "set-status", "ORD-1", "lost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown order status"));
}

#[test]
fn test_slides_follow_configured_language() {
    shop()
        .args(["slides"])
        .assert()
        .success()
        .stdout("1\tGlow Season\tNew skincare arrivals\n");

    shop()
        .env("LANGUAGE", "tr")
        .args(["slides"])
        .assert()
        .success()
        .stdout("1\tIşıltı Sezonu\tYeni cilt bakım ürünleri\n");
}
