//! Turns one stage's column data into entities.

use crate::entity::{Entity, FieldMap};
use crate::factory::Materialization;
use crate::naming::FieldNaming;
use crate::response::StageData;
use serde_json::Value;

/// Materialize every row of `data` as an entity of kind `model`.
///
/// Rows shorter than the field list pad with `null`. A stage without a row
/// list yields no entities. With a custom factory, every declared field is
/// re-assigned onto the factory's instance (renamed per `naming`),
/// overwriting whatever the factory put under the same name. Provenance is
/// stamped last under fixed, untransformed keys.
pub fn materialize(
    data: &StageData,
    model: &str,
    materialization: &Materialization,
    naming: FieldNaming,
) -> Vec<Entity> {
    let Some(rows) = data.objects.as_ref() else {
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let fields = zip_row(&data.fields, row);
            let mut entity = match materialization {
                Materialization::Default => Entity::from_fields(&fields, naming),
                Materialization::Custom(factory) => {
                    let mut entity = factory.create(&fields);
                    for (name, value) in &fields {
                        entity.set_field(naming.apply(name), value.clone());
                    }
                    entity
                }
            };
            let url = data.urls.get(i).cloned().flatten();
            entity.stamp_provenance(url, model);
            entity
        })
        .collect()
}

fn zip_row(names: &[String], row: &[Value]) -> FieldMap {
    names
        .iter()
        .enumerate()
        .map(|(j, name)| (name.clone(), row.get(j).cloned().unwrap_or(Value::Null)))
        .collect()
}
