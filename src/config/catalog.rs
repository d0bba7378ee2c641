//! The ERP entity catalog: every entity exposed over REST and SOAP, built once at startup.

use crate::config::types::{ColumnDef, ColumnType::*, EntityDef, ValidationRule};
use serde_json::json;

/// All entities in registration order.
pub fn standard_entities() -> Vec<EntityDef> {
    vec![
        department(),
        faculty(),
        course(),
        subject(),
        guardian(),
        student(),
        role(),
        user(),
        user_role(),
        contact_details(),
        admission(),
        enrollment(),
        attendance(),
        payment(),
        fees(),
        exam(),
        result(),
        hostel(),
        room(),
        hostel_allocation(),
        library(),
        book_issue(),
    ]
}

fn student() -> EntityDef {
    EntityDef::new("student", "Student", "student")
        .column(ColumnDef::id("student_id"))
        .column(ColumnDef::new("first_name", Text).required())
        .column(ColumnDef::new("last_name", Text).required())
        .column(ColumnDef::new("dob", Date))
        .column(ColumnDef::new("email", Text).required().unique())
        .column(ColumnDef::new("department_id", Int).references("department"))
        .column(ColumnDef::new("course_id", Int).references("course"))
        .column(ColumnDef::new("guardian_id", Int).references("guardian"))
        .column(ColumnDef::new("admission_date", Date))
        .column(ColumnDef::new("verified", Bool))
        .rule("first_name", ValidationRule::required())
        .rule("last_name", ValidationRule::required())
        .rule("email", ValidationRule::required().email())
        .hub_event("ReceiveStudentUpdate")
}

fn faculty() -> EntityDef {
    EntityDef::new("faculty", "Faculty", "faculty")
        .column(ColumnDef::id("faculty_id"))
        .column(ColumnDef::new("first_name", Text).required())
        .column(ColumnDef::new("last_name", Text).required())
        .column(ColumnDef::new("email", Text).required().unique())
        .column(ColumnDef::new("phone", Text))
        .column(ColumnDef::new("department_id", Int).references("department"))
        .column(ColumnDef::new("is_active", Bool))
        .rule("first_name", ValidationRule::required())
        .rule("last_name", ValidationRule::required())
        .rule("email", ValidationRule::required().email())
}

fn department() -> EntityDef {
    EntityDef::new("department", "Department", "department")
        .column(ColumnDef::id("dept_id"))
        .column(ColumnDef::new("dept_name", Text).required())
        .column(ColumnDef::new("dept_description", Text))
        .column(ColumnDef::new("hod_id", Int))
        .rule("dept_name", ValidationRule::required())
        .hub_event("ReceiveDepartmentUpdate")
}

fn course() -> EntityDef {
    EntityDef::new("course", "Course", "course")
        .column(ColumnDef::id("course_id"))
        .column(ColumnDef::new("course_name", Text).required())
        .column(ColumnDef::new("course_code", Text).required())
        .column(ColumnDef::new("course_description", Text))
        .column(ColumnDef::new("dept_id", Int).references("department"))
        .column(ColumnDef::new("duration", Int))
        .column(ColumnDef::new("fees", Decimal))
        .rule("course_name", ValidationRule::required())
        .rule("course_code", ValidationRule::required())
        .hub_event("ReceiveCourseUpdate")
}

fn subject() -> EntityDef {
    EntityDef::new("subject", "Subject", "subject")
        .column(ColumnDef::id("subject_code"))
        .column(ColumnDef::new("course_id", Int).references("course"))
        .column(ColumnDef::new("subject_name", Text).required())
        .column(ColumnDef::new("credits", Int))
        .rule("subject_name", ValidationRule::required())
}

fn role() -> EntityDef {
    EntityDef::new("role", "Role", "role")
        .column(ColumnDef::id("role_id"))
        .column(ColumnDef::new("role_name", Text).required().unique())
        .column(ColumnDef::new("role_description", Text))
        .rule("role_name", ValidationRule::required())
}

fn user() -> EntityDef {
    EntityDef::new("user", "User", "usr")
        .column(ColumnDef::id("user_id"))
        .column(ColumnDef::new("full_name", Text).required())
        .column(ColumnDef::new("email", Text).required().unique())
        .column(ColumnDef::new("dob", Date))
        .column(ColumnDef::new("password_hash", Text).required().sensitive())
        .column(ColumnDef::new("is_active", Bool).default_value(json!(true)))
        .column(ColumnDef::created_at())
        .column(ColumnDef::updated_at())
        .rule("full_name", ValidationRule::required())
        .rule("email", ValidationRule::required().email())
        .hub_event("ReceiveUserUpdate")
}

fn user_role() -> EntityDef {
    EntityDef::new("userrole", "UserRole", "user_role")
        .column(ColumnDef::id("user_role_id"))
        .column(ColumnDef::new("user_id", Int).required().references("user"))
        .column(ColumnDef::new("role_id", Int).required().references("role"))
        .rule("user_id", ValidationRule::required().greater_than(0.0))
        .rule("role_id", ValidationRule::required().greater_than(0.0))
}

fn contact_details() -> EntityDef {
    EntityDef::new("contactdetails", "ContactDetails", "contact_details")
        .column(ColumnDef::id("contact_id"))
        .column(ColumnDef::new("user_id", Int).required().references("user"))
        .column(ColumnDef::new("contact_type", Text).required())
        .column(ColumnDef::new("contact_value", Text).required())
        .column(ColumnDef::new("is_primary", Bool))
        .rule("user_id", ValidationRule::required().greater_than(0.0))
        .rule("contact_type", ValidationRule::required())
        .rule("contact_value", ValidationRule::required())
}

fn guardian() -> EntityDef {
    EntityDef::new("guardian", "Guardian", "guardian")
        .column(ColumnDef::id("guardian_id"))
        .column(ColumnDef::new("student_id", Int))
        .column(ColumnDef::new("name", Text).required())
        .column(ColumnDef::new("relationship", Text).required())
        .column(ColumnDef::new("mobile", Text))
        .column(ColumnDef::new("address", Text))
        .rule("name", ValidationRule::required())
        .rule("relationship", ValidationRule::required())
}

fn admission() -> EntityDef {
    EntityDef::new("admission", "Admission", "admission")
        .column(ColumnDef::id("admission_id"))
        .column(ColumnDef::new("full_name", Text).required())
        .column(ColumnDef::new("email", Text).required())
        .column(ColumnDef::new("dob", Date))
        .column(ColumnDef::new("contact_no", Text))
        .column(ColumnDef::new("address", Text))
        .column(ColumnDef::new("dept_id", Int).references("department"))
        .column(ColumnDef::new("course_id", Int).required().references("course"))
        .column(ColumnDef::new("applied_on", Timestamp))
        .column(ColumnDef::new("verified", Bool))
        .column(ColumnDef::new("confirmed", Bool))
        .column(ColumnDef::created_at())
        .column(ColumnDef::updated_at())
        .rule("course_id", ValidationRule::required().greater_than(0.0))
        .rule("full_name", ValidationRule::required())
        .rule("email", ValidationRule::required().email())
}

fn enrollment() -> EntityDef {
    EntityDef::new("enrollment", "Enrollment", "enrollment")
        .column(ColumnDef::id("enrollment_id"))
        .column(ColumnDef::new("student_id", Int).required().references("student"))
        .column(ColumnDef::new("course_id", Int).required().references("course"))
        .column(ColumnDef::new("enrollment_date", Date).required())
        .column(ColumnDef::new("status", Text))
        .rule("student_id", ValidationRule::required().greater_than(0.0))
        .rule("course_id", ValidationRule::required().greater_than(0.0))
        .rule("enrollment_date", ValidationRule::required())
}

fn attendance() -> EntityDef {
    EntityDef::new("attendance", "Attendance", "attendance")
        .column(ColumnDef::id("attendance_id"))
        .column(ColumnDef::new("student_id", Int).required().references("student"))
        .column(ColumnDef::new("course_id", Int).required().references("course"))
        .column(ColumnDef::new("date", Date).required())
        .column(ColumnDef::new("present", Bool).required().default_value(json!(false)))
        .rule("student_id", ValidationRule::required().greater_than(0.0))
        .rule("course_id", ValidationRule::required().greater_than(0.0))
        .rule("date", ValidationRule::required())
}

fn payment() -> EntityDef {
    EntityDef::new("payment", "Payment", "payment")
        .column(ColumnDef::id("payment_id"))
        .column(ColumnDef::new("student_id", Int).required().references("student"))
        .column(ColumnDef::new("amount", Decimal).required())
        .column(ColumnDef::new("payment_date", Date).required())
        .column(ColumnDef::new("status", Text).required().default_value(json!("pending")))
        .column(ColumnDef::new("mode", Text))
        .rule("student_id", ValidationRule::required().greater_than(0.0))
        .rule("amount", ValidationRule::required().greater_than(0.0))
        .rule("payment_date", ValidationRule::required())
}

fn fees() -> EntityDef {
    EntityDef::new("fees", "Fees", "fees")
        .column(ColumnDef::id("fee_id"))
        .column(ColumnDef::new("student_id", Int).references("student"))
        .column(ColumnDef::new("fee_type", Text).required())
        .column(ColumnDef::new("amount", Decimal).required())
        .column(ColumnDef::new("due_date", Date).required())
        .column(ColumnDef::new("paid_on", Date))
        .column(ColumnDef::new("payment_status", Text))
        .column(ColumnDef::new("payment_mode", Text))
        .column(ColumnDef::created_at())
        .column(ColumnDef::updated_at())
        .rule("fee_type", ValidationRule::required())
        .rule("amount", ValidationRule::required().greater_than(0.0))
        .rule("due_date", ValidationRule::required())
        .hub_event("ReceiveFeesUpdate")
}

fn exam() -> EntityDef {
    EntityDef::new("exam", "Exam", "exam")
        .column(ColumnDef::id("exam_id"))
        .column(ColumnDef::new("dept_id", Int).required().references("department"))
        .column(ColumnDef::new("subject_code", Int).required().references("subject"))
        .column(ColumnDef::new("exam_date", Date).required())
        .column(ColumnDef::new("assessment_type", Text).required())
        .column(ColumnDef::new("max_marks", Int))
        .column(ColumnDef::new("created_by", Int))
        .column(ColumnDef::created_at())
        .column(ColumnDef::updated_at())
        .rule("dept_id", ValidationRule::required().greater_than(0.0))
        .rule("subject_code", ValidationRule::required().greater_than(0.0))
        .rule("exam_date", ValidationRule::required())
        .rule("assessment_type", ValidationRule::required())
        .hub_event("ReceiveExamUpdate")
}

fn result() -> EntityDef {
    EntityDef::new("result", "Result", "result")
        .column(ColumnDef::id("result_id"))
        .column(ColumnDef::new("exam_id", Int).required().references("exam"))
        .column(ColumnDef::new("student_id", Int).required().references("student"))
        .column(ColumnDef::new("marks", Int).required())
        .column(ColumnDef::new("grade", Text))
        .rule("student_id", ValidationRule::required().greater_than(0.0))
        .rule("exam_id", ValidationRule::required().greater_than(0.0))
        .rule("marks", ValidationRule::required().at_least(0.0))
}

fn hostel() -> EntityDef {
    EntityDef::new("hostel", "Hostel", "hostel")
        .column(ColumnDef::id("hostel_id"))
        .column(ColumnDef::new("hostel_name", Text).required())
        .column(ColumnDef::new("type", Text).required())
        .rule("hostel_name", ValidationRule::required())
        .rule("type", ValidationRule::required())
}

fn room() -> EntityDef {
    EntityDef::new("room", "Room", "room")
        .column(ColumnDef::id("room_id"))
        .column(ColumnDef::new("hostel_id", Int).required().references("hostel"))
        .column(ColumnDef::new("room_no", Text).required())
        .column(ColumnDef::new("capacity", Int))
        .column(ColumnDef::new("occupancy_status", Text))
        .rule("hostel_id", ValidationRule::required().greater_than(0.0))
        .rule("room_no", ValidationRule::required())
}

fn hostel_allocation() -> EntityDef {
    EntityDef::new("hostelallocation", "HostelAllocation", "hostel_allocation")
        .column(ColumnDef::id("allocation_id"))
        .column(ColumnDef::new("student_id", Int).required().references("student"))
        .column(ColumnDef::new("hostel_id", Int).required().references("hostel"))
        .column(ColumnDef::new("room_id", Int).required().references("room"))
        .column(ColumnDef::new("start_date", Date).required())
        .column(ColumnDef::new("end_date", Date))
        .column(ColumnDef::new("status", Text).required())
        .column(ColumnDef::created_at())
        .column(ColumnDef::updated_at())
        .rule("student_id", ValidationRule::required().greater_than(0.0))
        .rule("hostel_id", ValidationRule::required().greater_than(0.0))
        .rule("room_id", ValidationRule::required().greater_than(0.0))
        .rule("start_date", ValidationRule::required())
        .rule("status", ValidationRule::required())
}

fn library() -> EntityDef {
    EntityDef::new("library", "Library", "library")
        .column(ColumnDef::id("book_id"))
        .column(ColumnDef::new("title", Text).required())
        .column(ColumnDef::new("author", Text).required())
        .column(ColumnDef::new("shelf", Text))
        .column(ColumnDef::new("isbn", Text))
        .column(ColumnDef::new("copies", Int))
        .rule("title", ValidationRule::required())
        .rule("author", ValidationRule::required())
}

fn book_issue() -> EntityDef {
    EntityDef::new("bookissue", "BookIssue", "book_issue")
        .column(ColumnDef::id("issue_id"))
        .column(ColumnDef::new("book_id", Int).required().references("library"))
        .column(ColumnDef::new("student_id", Int).required().references("student"))
        .column(ColumnDef::new("issue_date", Date).required())
        .column(ColumnDef::new("return_date", Date))
        .column(ColumnDef::new("status", Text))
        .rule("student_id", ValidationRule::required().greater_than(0.0))
        .rule("book_id", ValidationRule::required().greater_than(0.0))
        .rule("issue_date", ValidationRule::required())
}
