//! Host-shaped property tables built in Rust memory
//!
//! Tests describe a tree with [`table`], [`leaf`] and [`child`], then build
//! real `RecvTable`/`ClientClass` layouts whose pointers stay valid for as
//! long as the owning value lives.

use std::ffi::CString;

use srcsdk_sdk::{Address, ClientClass, RecvProp, RecvTable, SendPropType};

use super::table::TableRef;

pub(crate) struct TableDef {
    name: &'static str,
    nodes: Vec<Node>,
}

pub(crate) enum Node {
    Leaf {
        name: &'static str,
        offset: i32,
    },
    Child {
        name: &'static str,
        offset: i32,
        table: TableDef,
    },
}

pub(crate) fn table(name: &'static str, nodes: Vec<Node>) -> TableDef {
    TableDef { name, nodes }
}

pub(crate) fn leaf(name: &'static str, offset: i32) -> Node {
    Node::Leaf { name, offset }
}

pub(crate) fn child(name: &'static str, offset: i32, table: TableDef) -> Node {
    Node::Child {
        name,
        offset,
        table,
    }
}

/// A built table and everything its pointers reach
pub(crate) struct OwnedTable {
    raw: Box<RecvTable>,
    _props: Box<[RecvProp]>,
    _names: Vec<CString>,
    _children: Vec<OwnedTable>,
}

impl OwnedTable {
    pub(crate) fn build(def: TableDef) -> Self {
        let mut names = Vec::new();
        let mut children = Vec::new();
        let mut props = Vec::with_capacity(def.nodes.len());

        for node in def.nodes {
            let mut prop = RecvProp::empty();
            let (name, offset) = match node {
                Node::Leaf { name, offset } => (name, offset),
                Node::Child {
                    name,
                    offset,
                    table,
                } => {
                    let mut built = OwnedTable::build(table);
                    prop.recv_type = SendPropType::DataTable as i32;
                    prop.data_table = &mut *built.raw as *mut RecvTable;
                    children.push(built);
                    (name, offset)
                }
            };

            let name = CString::new(name).unwrap();
            prop.var_name = name.as_ptr();
            prop.offset = offset;
            names.push(name);
            props.push(prop);
        }

        let mut props = props.into_boxed_slice();
        let table_name = CString::new(def.name).unwrap();
        let raw = Box::new(RecvTable {
            props: props.as_mut_ptr(),
            prop_count: props.len() as i32,
            decoder: std::ptr::null_mut(),
            net_table_name: table_name.as_ptr(),
            initialized: true,
            in_main_list: true,
        });
        names.push(table_name);

        Self {
            raw,
            _props: props,
            _names: names,
            _children: children,
        }
    }

    pub(crate) fn view(&self) -> TableRef<'_> {
        unsafe { TableRef::from_ptr(&*self.raw) }.unwrap()
    }

    pub(crate) fn address(&self) -> Address {
        Address::from_ptr(&*self.raw as *const RecvTable)
    }
}

/// A built class list
pub(crate) struct ClassList {
    classes: Vec<Box<ClientClass>>,
    _names: Vec<CString>,
    _tables: Vec<OwnedTable>,
}

impl ClassList {
    pub(crate) fn build(entries: Vec<(&'static str, i32, TableDef)>) -> Self {
        let mut classes: Vec<Box<ClientClass>> = Vec::new();
        let mut names = Vec::new();
        let mut tables = Vec::new();

        for (name, class_id, def) in entries {
            let mut table = OwnedTable::build(def);
            let name = CString::new(name).unwrap();
            classes.push(Box::new(ClientClass {
                create_fn: std::ptr::null(),
                create_event_fn: std::ptr::null(),
                network_name: name.as_ptr(),
                recv_table: &mut *table.raw as *mut RecvTable,
                next: std::ptr::null_mut(),
                class_id,
            }));
            names.push(name);
            tables.push(table);
        }

        for i in 1..classes.len() {
            let next: *mut ClientClass = &mut *classes[i];
            classes[i - 1].next = next;
        }

        Self {
            classes,
            _names: names,
            _tables: tables,
        }
    }

    pub(crate) fn head(&self) -> Address {
        self.classes
            .first()
            .map(|class| Address::from_ptr(&**class as *const ClientClass))
            .unwrap_or(Address::NULL)
    }
}

/// Tables shaped like a Source 1 player, used across the crate's tests
///
/// | path | absolute offset |
/// |------|-----------------|
/// | `m_iTeamNum` | 0xF4 |
/// | `m_vecOrigin` | 0x138 |
/// | `m_iHealth` | 0x100 |
/// | `m_lifeState` | 0x25F |
/// | `m_fFlags` | 0x104 |
/// | `m_vecVelocity[0]` | 0x114 |
/// | `m_nTickBase` | 0x3430 |
/// | `m_Local.m_vecPunchAngle` | 0x2FAC + 0x70 |
/// | `m_flSimulationTime` | 0x268 |
/// | `m_iPing` (array) | 0xAF0 |
pub(crate) fn player_classes() -> ClassList {
    let base_entity = || {
        table(
            "DT_BaseEntity",
            vec![
                leaf("m_flSimulationTime", 0x268),
                leaf("m_iTeamNum", 0xF4),
                leaf("m_vecOrigin", 0x138),
            ],
        )
    };

    ClassList::build(vec![
        ("CBaseEntity", 1, base_entity()),
        (
            "CBasePlayer",
            35,
            table(
                "DT_BasePlayer",
                vec![
                    child("baseclass", 0, base_entity()),
                    child(
                        "localdata",
                        0,
                        table(
                            "DT_LocalPlayerExclusive",
                            vec![
                                child(
                                    "m_Local",
                                    0x2FAC,
                                    table("DT_Local", vec![leaf("m_vecPunchAngle", 0x70)]),
                                ),
                                leaf("m_vecVelocity[0]", 0x114),
                                leaf("m_nTickBase", 0x3430),
                            ],
                        ),
                    ),
                    leaf("m_iHealth", 0x100),
                    leaf("m_lifeState", 0x25F),
                    leaf("m_fFlags", 0x104),
                ],
            ),
        ),
        (
            "CPlayerResource",
            41,
            table(
                "DT_PlayerResource",
                vec![
                    child(
                        "m_iPing",
                        0xAF0,
                        table("m_iPing", vec![leaf("000", 0), leaf("001", 4)]),
                    ),
                    child(
                        "m_iHealth",
                        0xE08,
                        table("m_iHealth", vec![leaf("000", 0), leaf("001", 4)]),
                    ),
                ],
            ),
        ),
    ])
}
