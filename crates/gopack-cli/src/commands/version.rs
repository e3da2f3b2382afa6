use miette::Result;

pub fn run() -> Result<()> {
    println!("gopack {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
