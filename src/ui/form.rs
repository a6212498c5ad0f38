use crate::cluster::{Item, ItemFields, ItemKind};

pub const FORM_HINT: &str = "Alt+T to switch kind, Enter to save, Esc to leave";

/// Which input line has focus. Cluster forms only use the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Desc,
    Ram,
    Cpu,
    CpuSpeed,
}

impl Default for Field {
    fn default() -> Self {
        Field::Name
    }
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Desc => "Description",
            Field::Ram => "RAM",
            Field::Cpu => "CPU",
            Field::CpuSpeed => "CPU Speed",
        }
    }

    pub fn next(self, kind: ItemKind) -> Field {
        match (self, kind) {
            (Field::Name, _) => Field::Desc,
            (Field::Desc, ItemKind::Cluster) => Field::Name,
            (Field::Desc, ItemKind::Phone) => Field::Ram,
            (Field::Ram, _) => Field::Cpu,
            (Field::Cpu, _) => Field::CpuSpeed,
            (Field::CpuSpeed, _) => Field::Name,
        }
    }

    pub fn prev(self, kind: ItemKind) -> Field {
        match (self, kind) {
            (Field::Name, ItemKind::Cluster) => Field::Desc,
            (Field::Name, ItemKind::Phone) => Field::CpuSpeed,
            (Field::Desc, _) => Field::Name,
            (Field::Ram, _) => Field::Desc,
            (Field::Cpu, _) => Field::Ram,
            (Field::CpuSpeed, _) => Field::Cpu,
        }
    }
}

/// State of the create/edit screen. `editing` decides whether saving
/// creates a new item or rewrites an existing one.
#[derive(Debug, Default)]
pub struct Form {
    pub kind: ItemKind,
    pub focus: Field,
    pub name: String,
    pub desc: String,
    pub ram: String,
    pub cpu: String,
    pub cpu_speed: String,
    pub editing: Option<Item>,
    pub message: String,
}

impl Form {
    pub fn create(kind: ItemKind) -> Form {
        Form {
            kind,
            ..Default::default()
        }
    }

    pub fn edit(item: &Item) -> Form {
        let mut form = match item {
            Item::Cluster(cluster) => {
                let cluster = cluster.borrow();
                Form {
                    kind: ItemKind::Cluster,
                    name: cluster.name.clone(),
                    desc: cluster.desc.clone(),
                    ..Default::default()
                }
            }
            Item::Phone(phone) => {
                let phone = phone.borrow();
                Form {
                    kind: ItemKind::Phone,
                    name: phone.name.clone(),
                    desc: phone.desc.clone(),
                    ram: phone.ram.clone(),
                    cpu: phone.cpu.clone(),
                    cpu_speed: phone.cpu_speed.clone(),
                    ..Default::default()
                }
            }
        };
        form.editing = Some(item.clone());
        form
    }

    pub fn title(&self) -> String {
        let action = if self.editing.is_some() { "Edit" } else { "New" };
        let kind = match self.kind {
            ItemKind::Cluster => "Cluster",
            ItemKind::Phone => "Phone",
        };
        format!("{} {}", action, kind)
    }

    /// The input lines the current kind shows, in focus order.
    pub fn fields(&self) -> &'static [Field] {
        match self.kind {
            ItemKind::Cluster => &[Field::Name, Field::Desc],
            ItemKind::Phone => &[
                Field::Name,
                Field::Desc,
                Field::Ram,
                Field::Cpu,
                Field::CpuSpeed,
            ],
        }
    }

    /// Flips between cluster and phone. Editing an existing item keeps its
    /// kind, the toggle only applies while creating.
    pub fn toggle_kind(&mut self) {
        if self.editing.is_some() {
            return;
        }
        self.kind = match self.kind {
            ItemKind::Cluster => ItemKind::Phone,
            ItemKind::Phone => ItemKind::Cluster,
        };
        self.focus = Field::Name;
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next(self.kind);
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev(self.kind);
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Desc => &self.desc,
            Field::Ram => &self.ram,
            Field::Cpu => &self.cpu,
            Field::CpuSpeed => &self.cpu_speed,
        }
    }

    fn focused_value_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Name => &mut self.name,
            Field::Desc => &mut self.desc,
            Field::Ram => &mut self.ram,
            Field::Cpu => &mut self.cpu,
            Field::CpuSpeed => &mut self.cpu_speed,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_value_mut().push(c);
    }

    pub fn pop_char(&mut self) {
        self.focused_value_mut().pop();
    }

    pub fn to_fields(&self) -> ItemFields {
        ItemFields {
            name: self.name.clone(),
            desc: self.desc.clone(),
            ram: self.ram.clone(),
            cpu: self.cpu.clone(),
            cpu_speed: self.cpu_speed.clone(),
        }
    }
}
