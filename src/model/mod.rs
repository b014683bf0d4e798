//! Modelo de domínio: estágios, tarefas, itens e o registro de exame.

pub mod item;
pub mod record;
pub mod stage;

pub use item::{Alert, AlertType, Item, ItemPatch, Pending, SismamaRecord, Task, TaskPatch};
pub use record::{Extraction, ShiftData};
pub use stage::{Stage, Status};
