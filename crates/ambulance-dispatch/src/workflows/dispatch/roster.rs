//! CSV import for the drivers, vehicles and staff accounts that the dispatch workflow
//! references but does not own.
//!
//! Expected header:
//! `kind,id,hospital,first_name,last_name,phone,license_number,vehicle_number,vehicle_type`.
//! `kind` is one of `driver`, `vehicle` or `staff`; columns a kind does not use may be blank.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::{Driver, DriverId, HospitalId, StaffId, StaffMember, Vehicle, VehicleId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
    pub staff: Vec<StaffMember>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.drivers.len() + self.vehicles.len() + self.staff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownKind { line: u64, kind: String },
    MissingField { line: u64, field: &'static str },
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterError::UnknownKind { line, kind } => {
                write!(f, "line {}: unknown roster kind '{}'", line, kind)
            }
            RosterError::MissingField { line, field } => {
                write!(f, "line {}: {} is required", line, field)
            }
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Csv(err) => Some(err),
            RosterError::UnknownKind { .. } | RosterError::MissingField { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for RosterError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster, RosterError> {
    let file = File::open(path)?;
    parse_roster(file)
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Roster, RosterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut roster = Roster::default();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = record?;
        // header is line 1
        let line = index as u64 + 2;
        let id = row.id.clone().ok_or(RosterError::MissingField { line, field: "id" })?;
        let hospital = HospitalId(
            row.hospital
                .clone()
                .ok_or(RosterError::MissingField {
                    line,
                    field: "hospital",
                })?,
        );

        match row.kind.to_ascii_lowercase().as_str() {
            "driver" => roster.drivers.push(Driver {
                id: DriverId(id),
                hospital,
                first_name: row.first_name.unwrap_or_default(),
                last_name: row.last_name.unwrap_or_default(),
                phone: row.phone.unwrap_or_default(),
                license_number: row.license_number.unwrap_or_default(),
            }),
            "vehicle" => {
                let vehicle_number = row.vehicle_number.ok_or(RosterError::MissingField {
                    line,
                    field: "vehicle_number",
                })?;
                roster.vehicles.push(Vehicle {
                    id: VehicleId(id),
                    hospital,
                    name: vehicle_number.clone(),
                    vehicle_type: row.vehicle_type.unwrap_or_else(|| "ambulance".to_string()),
                    vehicle_number,
                });
            }
            "staff" => roster.staff.push(StaffMember {
                id: StaffId(id),
                hospital,
                first_name: row.first_name.unwrap_or_default(),
                last_name: row.last_name.unwrap_or_default(),
                phone: row.phone.unwrap_or_default(),
            }),
            _ => {
                return Err(RosterError::UnknownKind {
                    line,
                    kind: row.kind,
                })
            }
        }
    }

    Ok(roster)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    kind: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    hospital: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    first_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    license_number: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vehicle_number: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vehicle_type: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "kind,id,hospital,first_name,last_name,phone,license_number,vehicle_number,vehicle_type\n";

    #[test]
    fn parses_each_kind() {
        let csv = format!(
            "{HEADER}driver,drv-1,hosp-1,Dana,Reyes,555-0101,LIC-88,,\n\
             vehicle,veh-1,hosp-1,,,,,AMB-12,\n\
             staff,usr-1,hosp-1,Sam,Okafor,555-0199,,,\n"
        );
        let roster = parse_roster(csv.as_bytes()).expect("roster parses");

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.drivers[0].full_name(), "Dana Reyes");
        assert_eq!(roster.vehicles[0].vehicle_number, "AMB-12");
        assert_eq!(roster.vehicles[0].vehicle_type, "ambulance");
        assert_eq!(roster.staff[0].id, StaffId("usr-1".to_string()));
    }

    #[test]
    fn rejects_unknown_kind_with_line_number() {
        let csv = format!("{HEADER}helicopter,h-1,hosp-1,,,,,,\n");
        match parse_roster(csv.as_bytes()) {
            Err(RosterError::UnknownKind { line, kind }) => {
                assert_eq!(line, 2);
                assert_eq!(kind, "helicopter");
            }
            other => panic!("expected unknown kind, got {other:?}"),
        }
    }

    #[test]
    fn vehicles_need_a_number() {
        let csv = format!("{HEADER}vehicle,veh-1,hosp-1,,,,,,\n");
        assert!(matches!(
            parse_roster(csv.as_bytes()),
            Err(RosterError::MissingField {
                field: "vehicle_number",
                ..
            })
        ));
    }
}
