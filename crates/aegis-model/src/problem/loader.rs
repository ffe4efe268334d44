// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::{
    err::{InputError, LoaderError, non_negative},
    grade::GradeSet,
    problem::{
        doc::VesselProgramDocument,
        ldr::LoadingWindow,
        parcel::{Parcel, ParcelIdentifier},
        plant::{PlantDocument, PlantInput},
        program::{FreightTerms, TravelTable, VesselConstraints, VesselProgram},
    },
};
use aegis_core::prelude::DayPoint;
use serde::de::DeserializeOwned;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

/// Turns vessel program documents into a [`VesselProgram`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLoader {
    destination: String,
    default_travel_days: f64,
}

impl Default for ProgramLoader {
    fn default() -> Self {
        Self {
            destination: "Melaka".to_string(),
            default_travel_days: 2.0,
        }
    }
}

impl ProgramLoader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination used for travel-time lookups when the document names none.
    #[inline]
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    #[inline]
    pub fn default_travel_days(mut self, days: f64) -> Self {
        self.default_travel_days = days;
        self
    }

    pub fn from_document(&self, doc: &VesselProgramDocument) -> Result<VesselProgram, InputError> {
        let destination = doc.destination.as_deref().unwrap_or(&self.destination);

        let mut travel = TravelTable::new();
        for (route, days) in &doc.travel_times {
            travel.insert(route.clone(), non_negative("travel_times", *days)?);
        }

        let grades = GradeSet::from_names(doc.loading_date_ranges.iter().map(|e| e.grade.as_str()));

        let mut parcels = Vec::new();
        let mut next_id = 1u32;
        for entry in &doc.loading_date_ranges {
            let grade = grades.require(&entry.grade)?;
            let volume = non_negative("volume_kb", entry.volume_kb)?;
            let travel_time =
                travel.travel_time(&entry.origin, destination, self.default_travel_days);
            for text in entry.ldr.windows() {
                let window = LoadingWindow::parse(text)?;
                parcels.push(Parcel::new(
                    ParcelIdentifier::new(next_id),
                    grade,
                    volume,
                    entry.origin.clone(),
                    window,
                    travel_time,
                ));
                next_id += 1;
            }
        }

        let vc = &doc.vessel_constraints;
        let caps = &vc.max_volume_per_vessel;
        let mut constraints = VesselConstraints::new(
            non_negative("two_grades", caps.two_grades)?,
            non_negative("three_grades", caps.three_grades)?,
            vc.max_delivery_per_month,
        );
        if let Some(one) = caps.one_grade {
            constraints = constraints.with_one_grade_cap(non_negative("one_grade", one)?);
        }

        let base = doc
            .freight_cost_usd
            .or(vc.freight_cost_usd)
            .ok_or(InputError::MissingField("freight_cost_usd"))?;
        let base = non_negative("freight_cost_usd", base)?;
        let free = doc
            .free_vessel_count
            .unwrap_or(FreightTerms::DEFAULT_FREE_VESSELS);
        let freight = match doc.marginal_cost_usd {
            Some(m) => FreightTerms::new(base, free, non_negative("marginal_cost_usd", m)?),
            None => FreightTerms::with_average_marginal(base, free),
        };

        let mut targets = BTreeMap::new();
        for (grade, day) in &doc.target_delivery_dates {
            targets.insert(grades.require(grade)?, DayPoint::new(*day));
        }

        tracing::debug!(
            parcels = parcels.len(),
            grades = grades.len(),
            routes = travel.len(),
            "Loaded vessel program"
        );

        Ok(
            VesselProgram::new(grades, parcels, constraints, freight, destination)
                .with_targets(targets),
        )
    }

    pub fn from_bufread<R: BufRead>(&self, br: R) -> Result<VesselProgram, LoaderError> {
        let doc: VesselProgramDocument = read_json(br)?;
        Ok(self.from_document(&doc)?)
    }

    #[inline]
    pub fn from_path(&self, path: impl AsRef<Path>) -> Result<VesselProgram, LoaderError> {
        let file = File::open(path).map_err(LoaderError::Io)?;
        self.from_bufread(BufReader::new(file))
    }

    #[inline]
    pub fn from_reader<R: Read>(&self, r: R) -> Result<VesselProgram, LoaderError> {
        self.from_bufread(BufReader::new(r))
    }

    #[inline]
    pub fn from_str(&self, s: &str) -> Result<VesselProgram, LoaderError> {
        self.from_reader(s.as_bytes())
    }
}

/// Reads any JSON document from a buffered reader.
pub fn read_json<T: DeserializeOwned, R: BufRead>(br: R) -> Result<T, LoaderError> {
    Ok(serde_json::from_reader(br)?)
}

/// Reads any JSON document from a file.
pub fn read_json_path<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, LoaderError> {
    let file = File::open(path).map_err(LoaderError::Io)?;
    read_json(BufReader::new(file))
}

/// Loads and validates a plant description.
pub fn load_plant(path: impl AsRef<Path>) -> Result<PlantInput, LoaderError> {
    let doc: PlantDocument = read_json_path(path)?;
    Ok(PlantInput::from_document(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::LdrParseError;
    use aegis_core::prelude::{DayDelta, approx_eq};

    const SMALL: &str = r#"{
        "loading_date_ranges": [
            {"grade": "Base", "volume_kb": 400, "ldr": "1-3 Oct", "origin": "Terengganu"},
            {"grade": "A", "volume_kb": 150, "ldr": ["1-3 Oct", "10-12 Oct"], "origin": "Sabah"}
        ],
        "vessel_constraints": {
            "max_volume_per_vessel": {"two_grades": 700, "three_grades": 650},
            "max_delivery_per_month": 6,
            "freight_cost_usd": 600000
        },
        "travel_times": {"Terengganu to Melaka": 1.5, "Sabah to Melaka": 3}
    }"#;

    #[test]
    fn test_loads_parcels_with_ids_in_input_order() {
        let program = ProgramLoader::new().from_str(SMALL).unwrap();
        assert_eq!(program.parcels().len(), 3);
        assert_eq!(program.grades().len(), 2);

        let base = program
            .parcels()
            .iter()
            .find(|p| p.id() == ParcelIdentifier::new(1))
            .unwrap();
        assert_eq!(program.grades().name(base.grade()), "Base");
        assert_eq!(base.travel_time(), DayDelta::new(2));
        assert_eq!(base.earliest_arrival(), DayPoint::new(3));

        let late_a = program
            .parcels()
            .iter()
            .find(|p| p.id() == ParcelIdentifier::new(3))
            .unwrap();
        assert_eq!(late_a.window().start(), DayPoint::new(10));
    }

    #[test]
    fn test_freight_from_constraints_and_default_marginal() {
        let program = ProgramLoader::new().from_str(SMALL).unwrap();
        let f = program.freight();
        assert!(approx_eq(f.base_cost(), 600_000.0));
        assert_eq!(f.free_vessels(), 5);
        assert!(approx_eq(f.marginal_cost(), 120_000.0));
        assert_eq!(program.destination(), "Melaka");
    }

    #[test]
    fn test_missing_freight_is_an_input_error() {
        let mut doc: VesselProgramDocument = serde_json::from_str(SMALL).unwrap();
        doc.vessel_constraints.freight_cost_usd = None;
        let err = ProgramLoader::new().from_document(&doc).unwrap_err();
        assert_eq!(err, InputError::MissingField("freight_cost_usd"));

        // A top-level value takes precedence over the constraints block.
        doc.freight_cost_usd = Some(500_000.0);
        let program = ProgramLoader::new().from_document(&doc).unwrap();
        assert!(approx_eq(program.freight().base_cost(), 500_000.0));
    }

    #[test]
    fn test_bad_ldr_is_rejected_before_solving() {
        let text = SMALL.replace("\"1-3 Oct\", \"10-12 Oct\"", "\"12-10 Oct\"");
        let err = ProgramLoader::new().from_str(&text).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Input(InputError::Ldr(e)) if e == LdrParseError::new("12-10 Oct")
        ));
    }

    #[test]
    fn test_unknown_target_grade_is_rejected() {
        let mut doc: VesselProgramDocument = serde_json::from_str(SMALL).unwrap();
        doc.target_delivery_dates.insert("Z".to_string(), 5);
        let err = ProgramLoader::new().from_document(&doc).unwrap_err();
        assert!(matches!(err, InputError::UnknownGrade(_)));

        doc.target_delivery_dates.clear();
        doc.target_delivery_dates.insert("A".to_string(), 5);
        let program = ProgramLoader::new().from_document(&doc).unwrap();
        assert_eq!(program.targets().len(), 1);
    }

    #[test]
    fn test_load_all_instances_from_workspace_root_instances_folder() {
        use std::fs;
        use std::path::PathBuf;

        fn find_instances_dir() -> Option<PathBuf> {
            let mut cur: Option<&Path> = Some(Path::new(env!("CARGO_MANIFEST_DIR")));
            while let Some(p) = cur {
                let cand = p.join("instances");
                if cand.is_dir() {
                    return Some(cand);
                }
                cur = p.parent();
            }
            None
        }

        let inst_dir = find_instances_dir().expect(
            "Could not find an `instances/` directory in any ancestor of CARGO_MANIFEST_DIR",
        );

        // Vessel programs are named `program_*.json`, plants `plant_*.json`.
        let mut programs: Vec<PathBuf> = Vec::new();
        let mut plants: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(&inst_dir).expect("read_dir(instances) failed") {
            let path = entry.expect("bad dir entry").path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            if name.starts_with("program_") {
                programs.push(path);
            } else if name.starts_with("plant_") {
                plants.push(path);
            }
        }
        programs.sort();
        plants.sort();

        assert!(
            !programs.is_empty(),
            "No program_*.json files found in {}",
            inst_dir.display()
        );

        let loader = ProgramLoader::default();
        for path in programs {
            eprintln!("Loading program: {}", path.display());
            let program = loader
                .from_path(&path)
                .unwrap_or_else(|e| panic!("Failed to load {}: {e}", path.display()));
            assert!(
                !program.parcels().is_empty(),
                "No parcels parsed in {}",
                path.display()
            );
        }

        for path in plants {
            eprintln!("Loading plant: {}", path.display());
            let plant =
                load_plant(&path).unwrap_or_else(|e| panic!("Failed to load {}: {e}", path.display()));
            assert!(plant.capacity() > 0.0, "Zero capacity in {}", path.display());
        }
    }
}
