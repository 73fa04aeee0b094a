//! Commands typed at the `:` prompt.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use rental_core::{models::VehicleKind, store::DATE_FORMAT, Plate, VehicleStatus};

pub const USAGE: &str = "car|minibus|pickup PLATE MAKE MODEL YEAR ATTRS · customer ID NAME · \
rent|return PLATE CUSTOMER AMOUNT [DATE] · status PLATE STATUS";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddVehicle {
        plate: Plate,
        kind: VehicleKind,
        make: String,
        model: String,
        year: i32,
    },
    AddCustomer {
        id: i32,
        name: String,
    },
    Rent {
        plate: String,
        customer_id: i32,
        amount: f64,
        date: Option<NaiveDate>,
    },
    Return {
        plate: String,
        customer_id: i32,
        extra_fees: f64,
        date: Option<NaiveDate>,
    },
    SetStatus {
        plate: String,
        status: VehicleStatus,
    },
}

pub fn parse(input: &str) -> Result<Command> {
    let mut words = input.split_whitespace();
    let verb = words
        .next()
        .ok_or_else(|| anyhow!("empty command"))?
        .to_lowercase();
    let args: Vec<&str> = words.collect();

    match verb.as_str() {
        "car" | "minibus" | "pickup" => parse_vehicle(&verb, &args),
        "customer" => {
            let [id, name @ ..] = args.as_slice() else {
                bail!("usage: customer ID NAME");
            };
            if name.is_empty() {
                bail!("usage: customer ID NAME");
            }
            Ok(Command::AddCustomer {
                id: parse_arg("customer id", id)?,
                name: name.join(" "),
            })
        }
        "rent" | "return" => {
            let (plate, customer, amount, date) = match args.as_slice() {
                [plate, customer, amount] => (plate, customer, amount, None),
                [plate, customer, amount, date] => (plate, customer, amount, Some(date)),
                _ => bail!("usage: {verb} PLATE CUSTOMER_ID AMOUNT [YYYY-MM-DD]"),
            };
            let plate = plate.to_string();
            let customer_id = parse_arg("customer id", customer)?;
            let amount = parse_arg("amount", amount)?;
            let date = date
                .map(|raw| {
                    NaiveDate::parse_from_str(raw, DATE_FORMAT)
                        .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD"))
                })
                .transpose()?;
            Ok(if verb == "rent" {
                Command::Rent {
                    plate,
                    customer_id,
                    amount,
                    date,
                }
            } else {
                Command::Return {
                    plate,
                    customer_id,
                    extra_fees: amount,
                    date,
                }
            })
        }
        "status" => {
            let [plate, status @ ..] = args.as_slice() else {
                bail!("usage: status PLATE STATUS");
            };
            let status = status
                .join(" ")
                .parse::<VehicleStatus>()
                .map_err(|err| anyhow!(err))?;
            Ok(Command::SetStatus {
                plate: plate.to_string(),
                status,
            })
        }
        other => bail!("unknown command {other:?}"),
    }
}

fn parse_vehicle(verb: &str, args: &[&str]) -> Result<Command> {
    let [plate, make, model, year, attrs @ ..] = args else {
        bail!("usage: {verb} PLATE MAKE MODEL YEAR ...");
    };
    let kind = match (verb, attrs) {
        ("car", [seats]) => VehicleKind::Car {
            seats: parse_arg("seats", seats)?,
        },
        ("minibus", [accessible]) => VehicleKind::Minibus {
            accessible: parse_arg("accessible (true/false)", accessible)?,
        },
        ("pickup", [cargo, trailer]) => VehicleKind::PickupTruck {
            cargo_size: parse_arg("cargo size", cargo)?,
            has_trailer: parse_arg("trailer (true/false)", trailer)?,
        },
        ("car", _) => bail!("usage: car PLATE MAKE MODEL YEAR SEATS"),
        ("minibus", _) => bail!("usage: minibus PLATE MAKE MODEL YEAR ACCESSIBLE"),
        _ => bail!("usage: pickup PLATE MAKE MODEL YEAR CARGO TRAILER"),
    };
    Ok(Command::AddVehicle {
        plate: Plate::parse(plate)?,
        kind,
        make: make.to_string(),
        model: model.to_string(),
        year: parse_arg("year", year)?,
    })
}

fn parse_arg<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| anyhow!("invalid {name}: {raw:?}"))
}
