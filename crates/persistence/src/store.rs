// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-generic access to the record primitives.
//!
//! Diesel needs a concrete connection type to build a query, so each
//! primitive in `queries/` and `mutations/` exists once per backend. This
//! trait gathers both sets behind one interface so the orchestration in
//! `operations` is written once and runs inside a backend's
//! `write_transaction` unchanged.

use rescue_dispatch_domain::{
    ActivePointer, Assignment, AssignmentStatus, CallRecord, Dispatcher, Incident, IncidentStatus,
    NewDispatcher, NewPatient, NewRescuer, Patient, Rescuer, RescuerLocation, RescuerStatus,
};

use crate::backend::PersistenceBackend;
use crate::error::PersistenceError;
use crate::{mutations, queries};

/// Record-level reads and writes for one backend connection.
///
/// Implemented for `SqliteConnection`, and for `MysqlConnection` when the
/// `mysql` feature is enabled. See the `queries` and `mutations` modules
/// for the semantics of each method.
#[allow(clippy::missing_errors_doc)]
pub trait RecordStore: PersistenceBackend {
    // Incidents
    fn load_incident(&mut self, incident_id: i64) -> Result<Option<Incident>, PersistenceError>;
    fn find_incident_by_session(
        &mut self,
        call_session_id: &str,
    ) -> Result<Option<Incident>, PersistenceError>;
    fn list_incidents(
        &mut self,
        statuses: &[IncidentStatus],
        limit: Option<i64>,
    ) -> Result<Vec<Incident>, PersistenceError>;
    fn insert_incident(&mut self, incident: &Incident) -> Result<Incident, PersistenceError>;
    fn update_incident(
        &mut self,
        incident: &Incident,
        observed_last_updated: i64,
    ) -> Result<(), PersistenceError>;
    fn touch_incident(
        &mut self,
        incident_id: i64,
        observed_last_updated: i64,
        stamp: i64,
    ) -> Result<(), PersistenceError>;
    fn delete_incident(&mut self, incident_id: i64) -> Result<bool, PersistenceError>;
    fn clear_all(&mut self) -> Result<(), PersistenceError>;

    // Calls
    fn load_call(&mut self, incident_id: i64) -> Result<Option<CallRecord>, PersistenceError>;
    fn insert_call(&mut self, call: &CallRecord) -> Result<CallRecord, PersistenceError>;
    fn update_call(
        &mut self,
        call: &CallRecord,
        observed_revision: i64,
    ) -> Result<(), PersistenceError>;

    // Assignments
    fn load_assignment(
        &mut self,
        assignment_id: i64,
    ) -> Result<Option<Assignment>, PersistenceError>;
    fn list_assignments_for_incident(
        &mut self,
        incident_id: i64,
    ) -> Result<Vec<Assignment>, PersistenceError>;
    fn list_assignments_for_rescuer(
        &mut self,
        rescuer_id: i64,
    ) -> Result<Vec<Assignment>, PersistenceError>;
    fn list_assignments(
        &mut self,
        status: Option<AssignmentStatus>,
    ) -> Result<Vec<Assignment>, PersistenceError>;
    fn insert_assignment(&mut self, assignment: &Assignment)
    -> Result<Assignment, PersistenceError>;
    fn update_assignment(
        &mut self,
        assignment: &Assignment,
        expected: AssignmentStatus,
    ) -> Result<bool, PersistenceError>;

    // Active pointer
    fn load_pointer(&mut self, scope: &str) -> Result<Option<ActivePointer>, PersistenceError>;
    fn save_pointer(&mut self, pointer: &ActivePointer) -> Result<(), PersistenceError>;

    // Reference entities
    fn load_dispatcher(&mut self, dispatcher_id: i64)
    -> Result<Option<Dispatcher>, PersistenceError>;
    fn list_dispatchers(&mut self) -> Result<Vec<Dispatcher>, PersistenceError>;
    fn insert_dispatcher(
        &mut self,
        dispatcher: &NewDispatcher,
        now: i64,
    ) -> Result<Dispatcher, PersistenceError>;
    fn load_rescuer(&mut self, rescuer_id: i64) -> Result<Option<Rescuer>, PersistenceError>;
    fn list_rescuers(&mut self) -> Result<Vec<Rescuer>, PersistenceError>;
    fn insert_rescuer(&mut self, rescuer: &NewRescuer, now: i64)
    -> Result<Rescuer, PersistenceError>;
    fn set_rescuer_status(
        &mut self,
        rescuer_id: i64,
        status: RescuerStatus,
    ) -> Result<bool, PersistenceError>;
    fn update_rescuer_location(
        &mut self,
        rescuer_id: i64,
        location: RescuerLocation,
        now: i64,
    ) -> Result<bool, PersistenceError>;
    fn load_patient(&mut self, patient_id: i64) -> Result<Option<Patient>, PersistenceError>;
    fn list_patients(&mut self, limit: i64) -> Result<Vec<Patient>, PersistenceError>;
    fn insert_patient(&mut self, patient: &NewPatient, now: i64)
    -> Result<Patient, PersistenceError>;
}

/// Implements `RecordStore` for a connection type by forwarding every
/// method to the primitive generated with the given suffix.
macro_rules! impl_record_store {
    ($conn:ty, $suffix:ident) => {
        pastey::paste! {
            impl RecordStore for $conn {
                fn load_incident(&mut self, incident_id: i64) -> Result<Option<Incident>, PersistenceError> {
                    queries::incidents::[<load_incident _ $suffix>](self, incident_id)
                }

                fn find_incident_by_session(
                    &mut self,
                    call_session_id: &str,
                ) -> Result<Option<Incident>, PersistenceError> {
                    queries::incidents::[<find_incident_by_session _ $suffix>](self, call_session_id)
                }

                fn list_incidents(
                    &mut self,
                    statuses: &[IncidentStatus],
                    limit: Option<i64>,
                ) -> Result<Vec<Incident>, PersistenceError> {
                    queries::incidents::[<list_incidents _ $suffix>](self, statuses, limit)
                }

                fn insert_incident(&mut self, incident: &Incident) -> Result<Incident, PersistenceError> {
                    mutations::incidents::[<insert_incident _ $suffix>](self, incident)
                }

                fn update_incident(
                    &mut self,
                    incident: &Incident,
                    observed_last_updated: i64,
                ) -> Result<(), PersistenceError> {
                    mutations::incidents::[<update_incident _ $suffix>](self, incident, observed_last_updated)
                }

                fn touch_incident(
                    &mut self,
                    incident_id: i64,
                    observed_last_updated: i64,
                    stamp: i64,
                ) -> Result<(), PersistenceError> {
                    mutations::incidents::[<touch_incident _ $suffix>](
                        self,
                        incident_id,
                        observed_last_updated,
                        stamp,
                    )
                }

                fn delete_incident(&mut self, incident_id: i64) -> Result<bool, PersistenceError> {
                    mutations::incidents::[<delete_incident _ $suffix>](self, incident_id)
                }

                fn clear_all(&mut self) -> Result<(), PersistenceError> {
                    mutations::incidents::[<clear_all _ $suffix>](self)
                }

                fn load_call(&mut self, incident_id: i64) -> Result<Option<CallRecord>, PersistenceError> {
                    queries::calls::[<load_call _ $suffix>](self, incident_id)
                }

                fn insert_call(&mut self, call: &CallRecord) -> Result<CallRecord, PersistenceError> {
                    mutations::calls::[<insert_call _ $suffix>](self, call)
                }

                fn update_call(
                    &mut self,
                    call: &CallRecord,
                    observed_revision: i64,
                ) -> Result<(), PersistenceError> {
                    mutations::calls::[<update_call _ $suffix>](self, call, observed_revision)
                }

                fn load_assignment(
                    &mut self,
                    assignment_id: i64,
                ) -> Result<Option<Assignment>, PersistenceError> {
                    queries::assignments::[<load_assignment _ $suffix>](self, assignment_id)
                }

                fn list_assignments_for_incident(
                    &mut self,
                    incident_id: i64,
                ) -> Result<Vec<Assignment>, PersistenceError> {
                    queries::assignments::[<list_assignments_for_incident _ $suffix>](self, incident_id)
                }

                fn list_assignments_for_rescuer(
                    &mut self,
                    rescuer_id: i64,
                ) -> Result<Vec<Assignment>, PersistenceError> {
                    queries::assignments::[<list_assignments_for_rescuer _ $suffix>](self, rescuer_id)
                }

                fn list_assignments(
                    &mut self,
                    status: Option<AssignmentStatus>,
                ) -> Result<Vec<Assignment>, PersistenceError> {
                    queries::assignments::[<list_assignments _ $suffix>](self, status)
                }

                fn insert_assignment(
                    &mut self,
                    assignment: &Assignment,
                ) -> Result<Assignment, PersistenceError> {
                    mutations::assignments::[<insert_assignment _ $suffix>](self, assignment)
                }

                fn update_assignment(
                    &mut self,
                    assignment: &Assignment,
                    expected: AssignmentStatus,
                ) -> Result<bool, PersistenceError> {
                    mutations::assignments::[<update_assignment _ $suffix>](self, assignment, expected)
                }

                fn load_pointer(&mut self, scope: &str) -> Result<Option<ActivePointer>, PersistenceError> {
                    queries::pointer::[<load_pointer _ $suffix>](self, scope)
                }

                fn save_pointer(&mut self, pointer: &ActivePointer) -> Result<(), PersistenceError> {
                    mutations::pointer::[<save_pointer _ $suffix>](self, pointer)
                }

                fn load_dispatcher(
                    &mut self,
                    dispatcher_id: i64,
                ) -> Result<Option<Dispatcher>, PersistenceError> {
                    queries::profiles::[<load_dispatcher _ $suffix>](self, dispatcher_id)
                }

                fn list_dispatchers(&mut self) -> Result<Vec<Dispatcher>, PersistenceError> {
                    queries::profiles::[<list_dispatchers _ $suffix>](self)
                }

                fn insert_dispatcher(
                    &mut self,
                    dispatcher: &NewDispatcher,
                    now: i64,
                ) -> Result<Dispatcher, PersistenceError> {
                    mutations::profiles::[<insert_dispatcher _ $suffix>](self, dispatcher, now)
                }

                fn load_rescuer(&mut self, rescuer_id: i64) -> Result<Option<Rescuer>, PersistenceError> {
                    queries::profiles::[<load_rescuer _ $suffix>](self, rescuer_id)
                }

                fn list_rescuers(&mut self) -> Result<Vec<Rescuer>, PersistenceError> {
                    queries::profiles::[<list_rescuers _ $suffix>](self)
                }

                fn insert_rescuer(
                    &mut self,
                    rescuer: &NewRescuer,
                    now: i64,
                ) -> Result<Rescuer, PersistenceError> {
                    mutations::profiles::[<insert_rescuer _ $suffix>](self, rescuer, now)
                }

                fn set_rescuer_status(
                    &mut self,
                    rescuer_id: i64,
                    status: RescuerStatus,
                ) -> Result<bool, PersistenceError> {
                    mutations::profiles::[<set_rescuer_status _ $suffix>](self, rescuer_id, status)
                }

                fn update_rescuer_location(
                    &mut self,
                    rescuer_id: i64,
                    location: RescuerLocation,
                    now: i64,
                ) -> Result<bool, PersistenceError> {
                    mutations::profiles::[<update_rescuer_location _ $suffix>](self, rescuer_id, location, now)
                }

                fn load_patient(&mut self, patient_id: i64) -> Result<Option<Patient>, PersistenceError> {
                    queries::profiles::[<load_patient _ $suffix>](self, patient_id)
                }

                fn list_patients(&mut self, limit: i64) -> Result<Vec<Patient>, PersistenceError> {
                    queries::profiles::[<list_patients _ $suffix>](self, limit)
                }

                fn insert_patient(
                    &mut self,
                    patient: &NewPatient,
                    now: i64,
                ) -> Result<Patient, PersistenceError> {
                    mutations::profiles::[<insert_patient _ $suffix>](self, patient, now)
                }
            }
        }
    };
}

impl_record_store!(diesel::SqliteConnection, sqlite);

#[cfg(feature = "mysql")]
impl_record_store!(diesel::MysqlConnection, mysql);
