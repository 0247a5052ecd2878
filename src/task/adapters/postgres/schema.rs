//! Diesel schema for the ordered task collection.

diesel::table! {
    /// Task rows with their unique presentation order.
    tarefas (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Unique task name.
        nome -> Text,
        /// Non-negative cost.
        custo -> Numeric,
        /// Due date.
        data_limite -> Date,
        /// Unique presentation order.
        ordem_apresentacao -> Int4,
    }
}
