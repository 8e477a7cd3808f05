fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-env-changed=GUROBI_PATH");

    // The grb crate links against the Gurobi shared library found under GUROBI_PATH.
    #[cfg(feature = "gurobi")]
    {
        let path = std::env::var("GUROBI_PATH").map_err(|_| "GUROBI_PATH must point at the Gurobi lib directory")?;
        println!("cargo:rustc-link-search={path}");
    }

    Ok(())
}
