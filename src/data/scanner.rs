use super::container::{join_path, ArrayContainer, Entry};
use super::error::Result;
use super::model::DatasetDescriptor;

/// List every leaf array of a container, depth-first, in the container's own
/// member order. Groups are descended into but produce no descriptor.
pub fn scan(container: &dyn ArrayContainer) -> Result<Vec<DatasetDescriptor>> {
    let mut out = Vec::new();
    visit(container, "", &mut out)?;
    log::debug!("scanned {} datasets in {}", out.len(), container.name());
    Ok(out)
}

fn visit(
    container: &dyn ArrayContainer,
    group: &str,
    out: &mut Vec<DatasetDescriptor>,
) -> Result<()> {
    for entry in container.entries(group)? {
        match entry {
            Entry::Group(name) => visit(container, &join_path(group, &name), out)?,
            Entry::Dataset {
                name,
                shape,
                element_kind,
            } => out.push(DatasetDescriptor::new(
                join_path(group, &name),
                shape,
                element_kind,
            )),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::container::{ArrayData, MemoryContainer, NdArray};
    use crate::data::model::ElementKind;

    #[test]
    fn nested_leaves_are_listed_in_traversal_order() {
        let c = MemoryContainer::new()
            .with_dataset("Header/BoxSize", NdArray::vector(vec![100.0]))
            .unwrap()
            .with_dataset(
                "Halos/Sub/Pos",
                NdArray::rows3(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]),
            )
            .unwrap()
            .with_dataset(
                "Halos/ID",
                NdArray::new(vec![2], ArrayData::Int64(vec![1, 2])).unwrap(),
            )
            .unwrap();

        let found = scan(&c).unwrap();
        let paths: Vec<&str> = found.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, ["Header/BoxSize", "Halos/Sub/Pos", "Halos/ID"]);

        assert_eq!(found[1].shape, vec![2, 3]);
        assert_eq!(found[1].rank, 2);
        assert_eq!(found[2].element_kind, ElementKind::Int64);
        assert_eq!(found[2].basename(), "ID");
    }

    #[test]
    fn empty_container_scans_to_nothing() {
        assert!(scan(&MemoryContainer::new()).unwrap().is_empty());
    }
}
