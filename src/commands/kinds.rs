use crate::cpu;
use crate::kind::InstrumentKind;
use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};

pub fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["KIND", "MODE", "OUTPUT", "NOTES"]);

    for kind in InstrumentKind::ALL {
        let notes = match kind {
            InstrumentKind::ExecutionTime if !cpu::cpu_compiled() => "built without cpu feature",
            InstrumentKind::HeapAllocation => "needs sampling_allocator!()",
            InstrumentKind::LockContention => "records ProfiledMutex waits",
            InstrumentKind::BlockingWait => "records blocking::observe waits",
            InstrumentKind::ExecutionTrace => "needs TraceLayer",
            _ => "",
        };
        table.add_row(vec![
            kind.descriptive_name(),
            kind.mode_name(),
            kind.output_file_name(),
            notes,
        ]);
    }
    table
}

/// Run the kinds command
pub fn run() {
    println!("{}", table());
}
