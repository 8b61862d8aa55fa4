use crate::common::{avro_name, NameGenerator};
use crate::error::{ConversionError, Result};
use crate::forward::udt::UdtPool;
use crate::properties::PropertyTable;

/// Mutable state of one forward conversion call.
///
/// Created fresh for every top-level call and threaded through the
/// recursion, so nothing leaks between calls and concurrent calls never
/// share a pool or a name counter.
pub struct ForwardContext<'a> {
    pub table: &'a PropertyTable,
    pub pool: UdtPool,
    pub names: NameGenerator,
    /// User-defined types currently being converted, outermost first.
    resolving: Vec<String>,
}

impl<'a> ForwardContext<'a> {
    pub fn new(table: &'a PropertyTable, pool: UdtPool) -> Self {
        Self {
            table,
            pool,
            names: NameGenerator::new(),
            resolving: Vec::new(),
        }
    }

    /// Mark `name` as being converted.
    ///
    /// Fails when `name` is already on the stack: an unnamed definition
    /// (alias, array, map, union) that reaches itself has no finite form.
    pub fn enter_definition(&mut self, name: &str) -> Result<()> {
        let key = avro_name(name);
        if self.resolving.contains(&key) {
            let mut cycle = self.resolving.clone();
            cycle.push(key);
            return Err(ConversionError::Structural(format!(
                "recursive definition {}",
                cycle.join(" -> ")
            )));
        }
        self.resolving.push(key);
        Ok(())
    }

    pub fn exit_definition(&mut self) {
        self.resolving.pop();
    }
}
