use gest_types::*;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("gest basic usage example");

    // Shorthand input: pairs, sets, tagged lists and bare strings
    let mut vocs = Vocs::builder()
        .with_variables(json!({"x": [-5.0, 5.0], "y": [-3.0, 2.0]}))
        .variable("mode", Raw::<Variable>::set(["coarse", "fine"]))
        .with_objectives(json!({"f": "MAXIMIZE"}))
        .with_constraints(json!({"c": ["LESS_THAN", 0.0], "g": ["BOUNDS", -1.0, 1.0]}))
        .with_constants(json!({"seed": 42}))
        .with_observables(json!(["runtime"]))
        .build()?;

    println!("Inputs:  {:?}", vocs.input_names());
    println!("Outputs: {:?}", vocs.output_names());

    // Reassignment runs the same validation as construction
    if let Err(e) = vocs.set_variable("x", json!([5.0, -5.0])) {
        println!("Rejected reassignment: {e}");
    }
    vocs.set_constraint("c", Constraint::less_than(0.5))?;

    // Canonical dump round-trips through the coercion rules
    let dump = vocs.to_json_string_pretty()?;
    println!("{dump}");
    let restored = Vocs::from_json_str(&dump)?;
    assert_eq!(restored, vocs);
    println!("Round trip preserved {} names", restored.all_names().len());

    Ok(())
}
