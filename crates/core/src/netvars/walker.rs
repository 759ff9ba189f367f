//! Recursive property-table search
//!
//! Offsets in a child table are relative to the sub-object the parent prop
//! describes, so a nested field's absolute offset is the sum of the prop
//! offsets along the path from the root:
//!
//! ```text
//! DT_Root
//! └── A  (16) ──► DT_Child
//!                 └── B (4)        find_field(root, "B") == 16 + 4
//! ```
//!
//! Getting the accumulation wrong does not crash; it reads the wrong bytes.
//! Every function here is pure over borrowed views.

use tracing::warn;

use super::table::{ClassIter, ClassRef, PropRef, TableRef};

/// Deepest table nesting followed before giving up
pub const MAX_DEPTH: usize = 64;

/// A field found by the walker
#[derive(Debug, Clone, Copy)]
pub struct FieldMatch<'a> {
    /// The matching prop
    pub prop: PropRef<'a>,
    /// Offset from the start of the object the root table describes
    pub offset: i64,
}

/// Depth-first search for a prop named `name`
///
/// Siblings are visited in declaration order. A prop whose name matches is
/// returned with its own offset; otherwise its child table is searched and a
/// hit there gets the prop's offset added. The first match wins.
pub fn find_field<'a>(table: TableRef<'a>, name: &str) -> Option<FieldMatch<'a>> {
    search(table, name, 0)
}

fn search<'a>(table: TableRef<'a>, name: &str, depth: usize) -> Option<FieldMatch<'a>> {
    if depth >= MAX_DEPTH {
        warn!("property table {} nested deeper than {}", table.name(), MAX_DEPTH);
        return None;
    }

    for prop in table.props() {
        if prop.name() == name {
            return Some(FieldMatch {
                prop,
                offset: prop.offset() as i64,
            });
        }

        if let Some(child) = prop.child() {
            if let Some(found) = search(child, name, depth + 1) {
                return Some(FieldMatch {
                    prop: found.prop,
                    offset: found.offset + prop.offset() as i64,
                });
            }
        }
    }

    None
}

/// Resolve a dotted path such as `m_Local.m_vecPunchAngle`
///
/// The first segment is found anywhere under `table`; every later segment is
/// searched under the child table of the previous match.
pub fn find_path<'a>(table: TableRef<'a>, path: &str) -> Option<FieldMatch<'a>> {
    let mut segments = path.split('.');
    let mut found = find_field(table, segments.next()?)?;

    for segment in segments {
        let child = found.prop.child()?;
        let next = find_field(child, segment)?;
        found = FieldMatch {
            prop: next.prop,
            offset: found.offset + next.offset,
        };
    }

    Some(found)
}

/// Class with the given network name
pub fn find_class_by_name<'a>(mut classes: ClassIter<'a>, name: &str) -> Option<ClassRef<'a>> {
    classes.find(|class| class.name() == name)
}

/// Class with the given numeric id
pub fn find_class_by_id<'a>(mut classes: ClassIter<'a>, class_id: i32) -> Option<ClassRef<'a>> {
    classes.find(|class| class.class_id() == class_id)
}

/// Table with the given network name
///
/// Root tables of every class are checked first, then tables nested under
/// them, so both `DT_BasePlayer` and `DT_Local` can be found.
pub fn find_table<'a>(classes: ClassIter<'a>, name: &str) -> Option<TableRef<'a>> {
    let roots: Vec<TableRef<'a>> = classes.filter_map(|class| class.table()).collect();

    if let Some(root) = roots.iter().find(|root| root.name() == name) {
        return Some(*root);
    }

    roots
        .into_iter()
        .find_map(|root| find_nested_table(root, name, 0))
}

fn find_nested_table<'a>(table: TableRef<'a>, name: &str, depth: usize) -> Option<TableRef<'a>> {
    if depth >= MAX_DEPTH {
        return None;
    }

    table.props().filter_map(|prop| prop.child()).find_map(|child| {
        if child.name() == name {
            Some(child)
        } else {
            find_nested_table(child, name, depth + 1)
        }
    })
}

/// Flatten a table into `(path, offset)` pairs in declaration order
///
/// Nested props are reported as `parent.child`, with absolute offsets.
pub fn collect_fields(table: TableRef<'_>) -> Vec<(String, i64)> {
    let mut fields = Vec::new();
    collect_into(table, "", 0, 0, &mut fields);
    fields
}

fn collect_into(
    table: TableRef<'_>,
    prefix: &str,
    base: i64,
    depth: usize,
    fields: &mut Vec<(String, i64)>,
) {
    if depth >= MAX_DEPTH {
        return;
    }

    for prop in table.props() {
        let path = if prefix.is_empty() {
            prop.name().to_string()
        } else {
            format!("{}.{}", prefix, prop.name())
        };
        let offset = base + prop.offset() as i64;

        if let Some(child) = prop.child() {
            collect_into(child, &path, offset, depth + 1, fields);
        }
        fields.push((path, offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netvars::fixtures::{child, leaf, player_classes, table, OwnedTable};

    #[test]
    fn test_two_levels_accumulate() {
        let owned = OwnedTable::build(table(
            "DT_Root",
            vec![child("A", 16, table("DT_A", vec![leaf("B", 4)]))],
        ));

        let found = find_field(owned.view(), "B").unwrap();
        assert_eq!(found.offset, 20);
        assert_eq!(found.prop.name(), "B");
        assert_eq!(found.prop.offset(), 4);
    }

    #[test]
    fn test_three_levels_accumulate() {
        let owned = OwnedTable::build(table(
            "DT_Root",
            vec![child(
                "A",
                8,
                table("DT_A", vec![child("B", 4, table("DT_B", vec![leaf("C", 2)]))]),
            )],
        ));

        assert_eq!(find_field(owned.view(), "C").unwrap().offset, 14);
        assert_eq!(find_field(owned.view(), "B").unwrap().offset, 12);
        assert_eq!(find_field(owned.view(), "A").unwrap().offset, 8);
    }

    #[test]
    fn test_exact_match_returns_own_offset() {
        // A data-table prop that is itself the target is not descended into
        let owned = OwnedTable::build(table(
            "DT_Root",
            vec![child("m_Local", 0x40, table("DT_Local", vec![leaf("m_Local", 4)]))],
        ));
        assert_eq!(find_field(owned.view(), "m_Local").unwrap().offset, 0x40);
    }

    #[test]
    fn test_first_match_wins() {
        let owned = OwnedTable::build(table(
            "DT_Root",
            vec![
                child("first", 100, table("DT_First", vec![leaf("dup", 1)])),
                leaf("dup", 7),
            ],
        ));
        assert_eq!(find_field(owned.view(), "dup").unwrap().offset, 101);
    }

    #[test]
    fn test_missing_field_is_empty() {
        let owned = OwnedTable::build(table(
            "DT_Root",
            vec![child("A", 16, table("DT_A", vec![leaf("B", 4)]))],
        ));
        assert!(find_field(owned.view(), "Z").is_none());
        assert!(find_field(owned.view(), "").is_none());
        assert!(find_path(owned.view(), "A.Z").is_none());
        assert!(find_path(owned.view(), "A.B.C").is_none());
    }

    #[test]
    fn test_dotted_path() {
        let classes = player_classes();
        let root = find_table(unsafe { ClassIter::new(classes.head()) }, "DT_BasePlayer").unwrap();

        let punch = find_path(root, "m_Local.m_vecPunchAngle").unwrap();
        assert_eq!(punch.offset, 0x2FAC + 0x70);
        assert_eq!(find_path(root, "m_Local").unwrap().offset, 0x2FAC);
        assert_eq!(find_path(root, "m_iTeamNum").unwrap().offset, 0xF4);
        assert_eq!(find_path(root, "m_vecVelocity[0]").unwrap().offset, 0x114);
    }

    #[test]
    fn test_class_lookups() {
        let classes = player_classes();
        let iter = || unsafe { ClassIter::new(classes.head()) };

        let player = find_class_by_name(iter(), "CBasePlayer").unwrap();
        assert_eq!(player.class_id(), 35);
        assert_eq!(find_class_by_id(iter(), 41).unwrap().name(), "CPlayerResource");
        assert!(find_class_by_name(iter(), "CMissing").is_none());
        assert!(find_class_by_id(iter(), 999).is_none());

        let health = find_field(player.table().unwrap(), "m_iHealth").unwrap();
        assert_eq!(health.offset, 0x100);
    }

    #[test]
    fn test_find_nested_table() {
        let classes = player_classes();
        let iter = || unsafe { ClassIter::new(classes.head()) };

        assert_eq!(find_table(iter(), "DT_Local").unwrap().name(), "DT_Local");
        assert_eq!(find_table(iter(), "DT_BaseEntity").unwrap().len(), 3);
        assert!(find_table(iter(), "DT_Missing").is_none());
    }

    #[test]
    fn test_collect_fields() {
        let owned = OwnedTable::build(table(
            "DT_Root",
            vec![leaf("x", 4), child("A", 16, table("DT_A", vec![leaf("B", 4)]))],
        ));

        assert_eq!(
            collect_fields(owned.view()),
            vec![
                ("x".to_string(), 4),
                ("A.B".to_string(), 20),
                ("A".to_string(), 16)
            ]
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut def = table("DT_Leaf", vec![leaf("deep", 1)]);
        for _ in 0..MAX_DEPTH + 2 {
            def = table("DT_Level", vec![child("next", 0, def)]);
        }
        let owned = OwnedTable::build(def);

        assert!(find_field(owned.view(), "deep").is_none());
        assert!(find_field(owned.view(), "next").is_some());
    }
}
