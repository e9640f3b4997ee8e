use json_dict::xlsx::{column_widths, write_excel, ExcelOptions, Table};
use serde_json::json;

fn main() -> Result<(), json_dict::Error> {
    let path = std::env::temp_dir().join("json_dict_example_export.xlsx");

    let mut table = Table::new(["Name", "City", "Age", "Member"]);
    table.push_row([json!("Al"), json!("Rome"), json!(31), json!(true)]);
    table.push_row([json!("Alexandria"), json!("Lisbon"), json!(27), json!(false)]);
    table.push_row([json!("Bo"), json!(null), json!(45)]);

    let options = ExcelOptions::default();
    println!("column widths = {:?}", column_widths(&table, options.padding));

    write_excel(&path, &table, &options)?;
    println!("wrote {}", path.display());

    let _ = std::fs::remove_file(&path);
    Ok(())
}
