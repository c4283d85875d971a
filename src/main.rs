mod emit;
mod lexer;
mod moves;
mod parser;
mod state;
mod undeform;
mod untransform;

use std::fs;

#[derive(Debug)]
enum Error {
    Io(std::io::Error),
    Profile(String),
    Undeform(undeform::UndeformError),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Profile(e.to_string())
    }
}

impl From<state::ProfileError> for Error {
    fn from(e: state::ProfileError) -> Self {
        Error::Profile(e.to_string())
    }
}

impl From<undeform::UndeformError> for Error {
    fn from(e: undeform::UndeformError) -> Self {
        Error::Undeform(e)
    }
}

fn main() -> Result<(), Error> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: unwarp <profile.json> <input.gcode> [output.gcode]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  unwarp vase_profile.json sliced.gcode printer.gcode");
        std::process::exit(1);
    }

    let profile_path = &args[1];
    let input_path = &args[2];
    let output_path = args.get(3).map(|s| s.as_str()).unwrap_or("output.gcode");

    // Load the deformer state
    let profile: state::ProfileConfig = serde_json::from_str(&fs::read_to_string(profile_path)?)?;
    let deformer_state = profile.into_state()?;

    // Read input
    let source = fs::read_to_string(input_path)?;

    // Transform
    let undeformer = undeform::Undeformer::with_state(deformer_state);
    let lines = match undeformer.undeform(source.lines()) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("error: {}", e);
            return Err(e.into());
        }
    };

    // Write output
    let mut output = lines.join("\n");
    output.push('\n');
    fs::write(output_path, output)?;

    println!("Wrote {} lines to {}", lines.len(), output_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_to_output_pipeline() {
        let profile: state::ProfileConfig = serde_json::from_str(
            r#"{
                "offsets": [0.0, 0.0, 0.0],
                "samples": [
                    { "radius": 0.0, "angle_degrees": 0.0 },
                    { "radius": 50.0, "angle_degrees": 40.0 }
                ]
            }"#,
        )
        .expect("profile parses");
        let deformer_state = profile.into_state().expect("profile is valid");

        let undeformer = undeform::Undeformer::with_state(deformer_state);
        let lines = undeformer
            .undeform(
                "G28 ; home
G90
G1 F1800
G1 X25 Y0 Z2 E5
G1 X25 Y10 Z2 E0.5"
                    .lines(),
            )
            .expect("pipeline runs");

        // Body lines are all inverse-time feed moves in the polar frame
        let body: Vec<&String> = lines.iter().filter(|l| l.starts_with("G1 C")).collect();
        assert!(!body.is_empty());
        for line in body {
            assert!(line.contains(" X"));
            assert!(line.contains(" B-"));
            assert!(line.contains(" F"));
        }
    }

    #[test]
    fn test_tilted_profile_compensates_extrusion() {
        // 30 degree tilt everywhere: every extrusion shrinks by cos(30)
        let tilted = undeform::Undeformer::with_state(state::DeformerState::new(
            |_| 30f64.to_radians(),
            moves::Vec3::default(),
        ));
        let flat = undeform::Undeformer::with_state(state::DeformerState::new(
            |_| 0.0,
            moves::Vec3::default(),
        ));

        // A vertical feed move keeps every corrected segment at length 1,
        // so the only extrusion change left is the cosine compensation
        let gcode = ["G0 X10 Y0 Z30", "G1 X10 Y0 Z25 F600 E1"];
        let tilted_lines = tilted.undeform(gcode).unwrap();
        let flat_lines = flat.undeform(gcode).unwrap();

        let extrusion_sum = |lines: &[String]| -> f64 {
            lines
                .iter()
                .filter(|l| l.starts_with("G1 C"))
                .filter_map(|l| {
                    l.split_whitespace()
                        .find(|w| w.starts_with('E'))
                        .and_then(|w| w[1..].parse::<f64>().ok())
                })
                .sum()
        };

        let tilted_e = extrusion_sum(&tilted_lines);
        let flat_e = extrusion_sum(&flat_lines);
        assert!(tilted_e > 0.0 && flat_e > 0.0);
        assert!((tilted_e / flat_e - 30f64.to_radians().cos()).abs() < 1e-3);
    }
}
